use phaseflow::core::colormap::LUT_SIZE;
use phaseflow::ColorMap;

#[test]
fn constant_field_is_uniform_midpoint() {
    for map in ColorMap::ALL {
        let lut = map.lut();
        assert_eq!(lut.len(), LUT_SIZE);
        for value in [0.0, -4.5, 1e9] {
            let rgb = lut.map_autoscaled(&vec![value; 700 * 3]);
            assert!(rgb.iter().all(|&c| c == lut.entry(LUT_SIZE / 2)));
        }
    }
}

#[test]
fn autoscaling_is_per_frame() {
    let lut = ColorMap::Inferno.lut();
    let a = lut.map_autoscaled(&[0.0, 1.0, 2.0]);
    let b = lut.map_autoscaled(&[10.0, 12.0, 14.0]);
    assert_eq!(a, b);
    assert_eq!(a[0], lut.entry(0));
    assert_eq!(a[2], lut.entry(LUT_SIZE - 1));
}
