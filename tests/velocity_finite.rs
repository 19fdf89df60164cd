use phaseflow::core::synthetic::{SyntheticSpec, noise};
use phaseflow::{
    AnalyticSignal, Band, ChannelOrder, ElectrodeGrid, FrameSampler, SampledState,
    VelocityFieldEstimator,
};

#[test]
fn noise_never_produces_non_finite_positions() {
    let grid = ElectrodeGrid::new(8, 4, 2.0, ChannelOrder::ColumnMajor).unwrap();
    let spec = SyntheticSpec {
        frames: 600,
        ..SyntheticSpec::default()
    };
    let rec = noise(&grid, &spec).unwrap();
    let sig = AnalyticSignal::compute(&rec, Band::new(12.0, 15.0)).unwrap();
    for eps in [1e-3, 1e-12] {
        let est = VelocityFieldEstimator::new(eps, rec.timebase().dt());
        for idx in [1.0, 2.5, 300.0, 599.75, 600.0] {
            let state = FrameSampler::sample(&sig, idx).unwrap();
            let field = est.estimate(&grid, &state);
            for ch in 0..grid.channel_count() {
                assert!(field.vx[ch].is_finite() && field.vy[ch].is_finite());
                assert!(field.positions[ch].0.is_finite() && field.positions[ch].1.is_finite());
            }
        }
    }
}

#[test]
fn exactly_zero_gradient_stays_finite() {
    let grid = ElectrodeGrid::new(8, 4, 2.0, ChannelOrder::ColumnMajor).unwrap();
    let n = grid.channel_count();
    let state = SampledState {
        index: 5.0,
        amplitude: vec![1.0; n],
        phase: vec![1.25; n],
        phase_rate: vec![1e6; n],
    };
    for eps in [1e-3, 1e-300] {
        let field = VelocityFieldEstimator::new(eps, 1e-3).estimate(&grid, &state);
        assert_eq!(field.max_speed(), 0.0);
        assert_eq!(field.positions, grid.rest_positions());
    }
}
