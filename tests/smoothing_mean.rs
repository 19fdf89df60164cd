use approx::assert_abs_diff_eq;
use phaseflow::core::smoothing::BoxFilter;
use phaseflow::core::synthetic::{SyntheticSpec, in_phase, traveling_wave};
use phaseflow::core::util::{mean, white_noise};
use phaseflow::{
    ChannelOrder, ElectrodeGrid, FieldConfig, FrameSequencer, PipelineConfig, Recording, Session,
    SpatialFieldSynthesizer,
};

#[test]
fn box_filter_preserves_mean_of_unmasked_field() {
    let (w, h) = (120, 60);
    let filter = BoxFilter::new(11).unwrap();
    assert_eq!(filter.size(), 11);

    // Non-zero all the way to the border.
    let field: Vec<f64> = white_noise(w * h, 42).iter().map(|v| v + 0.5).collect();
    let out = filter.apply(&field, w, h);
    assert_eq!(out.len(), field.len());
    assert_abs_diff_eq!(mean(&out), mean(&field), epsilon = 1e-12);
}

#[test]
fn smoothing_reduces_spatial_variance() {
    let (w, h) = (64, 64);
    let field = white_noise(w * h, 3);
    let out = BoxFilter::new(11).unwrap().apply(&field, w, h);
    let var = |v: &[f64]| {
        let m = mean(v);
        v.iter().map(|x| (x - m).powi(2)).sum::<f64>() / v.len() as f64
    };
    assert!(var(&out) < 0.1 * var(&field));
}

/// Hull-masked interpolation of a pipeline frame and the smoothed field built from it.
fn raw_and_smoothed(rec: Recording, index: f64) -> (Vec<f64>, Vec<f64>) {
    let grid = ElectrodeGrid::new(8, 4, 2.0, ChannelOrder::ColumnMajor).unwrap();
    let field = FieldConfig {
        width: 141,
        height: 61,
        ..FieldConfig::default()
    };
    let synth = SpatialFieldSynthesizer::new(&field, &grid).unwrap();
    let config = PipelineConfig {
        field,
        ..PipelineConfig::default()
    };
    let seq = FrameSequencer::new(Session::new(rec, grid, config).unwrap()).unwrap();
    let set = seq.compute_frame(index).unwrap();
    let frame = &set.frames[0];

    let positions: Vec<(f64, f64)> = frame.markers.iter().map(|m| (m.x, m.y)).collect();
    let amplitudes: Vec<f64> = frame.markers.iter().map(|m| m.amplitude).collect();
    let raw = synth.interpolate(&positions, &amplitudes);
    (raw, frame.field.clone())
}

fn assert_same_mean(raw: &[f64], smoothed: &[f64]) {
    let scale = raw.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    assert!(scale > 0.0);
    assert_abs_diff_eq!(mean(smoothed), mean(raw), epsilon = 1e-12 * scale);
}

#[test]
fn pipeline_field_keeps_mean_of_in_phase_frame() {
    let grid = ElectrodeGrid::new(8, 4, 2.0, ChannelOrder::ColumnMajor).unwrap();
    let spec = SyntheticSpec {
        frames: 100,
        ..SyntheticSpec::default()
    };
    let (raw, smoothed) = raw_and_smoothed(in_phase(&grid, &spec).unwrap(), 100.0);
    // Zero velocity: the hull spans the whole dense grid, so the border is non-zero.
    assert!(raw[0] != 0.0 && raw[raw.len() - 1] != 0.0);
    assert_same_mean(&raw, &smoothed);
}

#[test]
fn pipeline_field_keeps_mean_of_traveling_frame() {
    let grid = ElectrodeGrid::new(8, 4, 2.0, ChannelOrder::ColumnMajor).unwrap();
    let spec = SyntheticSpec {
        frames: 400,
        ..SyntheticSpec::default()
    };
    let (raw, smoothed) = raw_and_smoothed(traveling_wave(&grid, &spec).unwrap(), 200.5);
    assert_same_mean(&raw, &smoothed);
}
