//! Dense field reconstruction for one band at one frame.
//!
//! Advected samples are interpolated onto the dense grid (zero outside their
//! hull), box-smoothed, scaled by the mode's gain, and in stacked mode mapped
//! through the band's lookup table with per-frame autoscaling.

use serde::{Deserialize, Serialize};

use crate::core::band::Band;
use crate::core::colormap::{ColorLut, Rgb};
use crate::core::error::PipelineError;
use crate::core::grid::ElectrodeGrid;
use crate::core::interp::{DenseGrid, InterpolationMethod, interpolate};
use crate::core::sampler::SampledState;
use crate::core::smoothing::BoxFilter;
use crate::core::velocity::VelocityField;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldMode {
    /// One scalar field per band.
    #[default]
    Scalar,
    /// Scalar field plus an RGB field per band.
    Stacked,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldConfig {
    pub width: usize,
    pub height: usize,
    pub smoothing_kernel: usize,
    pub mode: FieldMode,
    /// Post-smoothing gain in stacked mode.
    pub display_gain: f64,
    /// Post-smoothing gain in scalar mode.
    pub scalar_gain: f64,
    pub interpolation: InterpolationMethod,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: 700,
            height: 300,
            smoothing_kernel: 11,
            mode: FieldMode::Scalar,
            display_gain: 2.0,
            scalar_gain: 1.0,
            interpolation: InterpolationMethod::ThinPlate,
        }
    }
}

impl FieldConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        BoxFilter::new(self.smoothing_kernel)?;
        if self.width == 0 || self.height == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "grid resolution must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        for (name, gain) in [
            ("display_gain", self.display_gain),
            ("scalar_gain", self.scalar_gain),
        ] {
            if !gain.is_finite() {
                return Err(PipelineError::InvalidConfig(format!(
                    "{name} must be finite, got {gain}"
                )));
            }
        }
        Ok(())
    }

    /// Gain applied after smoothing for the configured mode.
    pub fn gain(&self) -> f64 {
        match self.mode {
            FieldMode::Scalar => self.scalar_gain,
            FieldMode::Stacked => self.display_gain,
        }
    }
}

/// Overlay marker at an advected channel position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Marker {
    pub channel: usize,
    pub x: f64,
    pub y: f64,
    pub amplitude: f64,
}

/// Everything a sink needs to draw one band of one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderableFrame {
    pub band: Band,
    pub width: usize,
    pub height: usize,
    /// Row-major `height x width`, row along y.
    pub field: Vec<f64>,
    /// Stacked mode only, same layout as `field`.
    pub rgb: Option<Vec<Rgb>>,
    pub markers: Vec<Marker>,
    pub velocity: VelocityField,
}

impl RenderableFrame {
    #[inline]
    pub fn value(&self, col: usize, row: usize) -> f64 {
        self.field[row * self.width + col]
    }
}

pub struct SpatialFieldSynthesizer {
    dense: DenseGrid,
    smoother: BoxFilter,
    mode: FieldMode,
    gain: f64,
    interpolation: InterpolationMethod,
}

impl SpatialFieldSynthesizer {
    /// The dense grid spans the rest lattice of `grid`.
    pub fn new(config: &FieldConfig, grid: &ElectrodeGrid) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            dense: DenseGrid::new(config.width, config.height, grid.extent())?,
            smoother: BoxFilter::new(config.smoothing_kernel)?,
            mode: config.mode,
            gain: config.gain(),
            interpolation: config.interpolation,
        })
    }

    pub fn dense_grid(&self) -> &DenseGrid {
        &self.dense
    }

    pub fn mode(&self) -> FieldMode {
        self.mode
    }

    /// Hull-masked interpolation only, before smoothing.
    pub fn interpolate(&self, positions: &[(f64, f64)], amplitudes: &[f64]) -> Vec<f64> {
        interpolate(&self.dense, positions, amplitudes, self.interpolation)
    }

    /// `lut` is required for an RGB field and ignored in scalar mode.
    pub fn synthesize(
        &self,
        band: Band,
        state: &SampledState,
        velocity: VelocityField,
        lut: Option<&ColorLut>,
    ) -> RenderableFrame {
        let raw = self.interpolate(&velocity.positions, &state.amplitude);
        let mut field = self
            .smoother
            .apply(&raw, self.dense.width(), self.dense.height());
        if self.gain != 1.0 {
            field.iter_mut().for_each(|v| *v *= self.gain);
        }

        let rgb = match (self.mode, lut) {
            (FieldMode::Stacked, Some(lut)) => Some(lut.map_autoscaled(&field)),
            _ => None,
        };

        let markers = velocity
            .positions
            .iter()
            .zip(&state.amplitude)
            .enumerate()
            .map(|(channel, (&(x, y), &amplitude))| Marker {
                channel,
                x,
                y,
                amplitude,
            })
            .collect();

        RenderableFrame {
            band,
            width: self.dense.width(),
            height: self.dense.height(),
            field,
            rgb,
            markers,
            velocity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::colormap::ColorMap;
    use crate::core::grid::ChannelOrder;
    use crate::core::velocity::VelocityFieldEstimator;
    use approx::assert_abs_diff_eq;

    fn uniform_state(grid: &ElectrodeGrid, amp: f64) -> SampledState {
        let n = grid.channel_count();
        SampledState {
            index: 10.0,
            amplitude: vec![amp; n],
            phase: vec![0.3; n],
            phase_rate: vec![80.0; n],
        }
    }

    fn small_config(mode: FieldMode) -> FieldConfig {
        FieldConfig {
            width: 71,
            height: 31,
            mode,
            ..FieldConfig::default()
        }
    }

    #[test]
    fn uniform_amplitude_gives_flat_interior() {
        let grid = ElectrodeGrid::new(8, 4, 2.0, ChannelOrder::ColumnMajor).unwrap();
        let synth = SpatialFieldSynthesizer::new(&small_config(FieldMode::Scalar), &grid).unwrap();
        let state = uniform_state(&grid, 0.8);
        let vel = VelocityFieldEstimator::new(1e-3, 1e-3).estimate(&grid, &state);
        let frame = synth.synthesize(Band::new(12.0, 15.0), &state, vel, None);
        assert_eq!(frame.field.len(), 71 * 31);
        assert!(frame.rgb.is_none());
        assert_abs_diff_eq!(frame.value(35, 15), 0.8, epsilon = 1e-9);
        assert_eq!(frame.markers.len(), 32);
        assert_eq!((frame.markers[5].x, frame.markers[5].y), grid.position(5));
    }

    #[test]
    fn stacked_mode_applies_gain_and_colors() {
        let grid = ElectrodeGrid::new(8, 4, 2.0, ChannelOrder::ColumnMajor).unwrap();
        let synth = SpatialFieldSynthesizer::new(&small_config(FieldMode::Stacked), &grid).unwrap();
        let state = uniform_state(&grid, 0.8);
        let vel = VelocityFieldEstimator::new(1e-3, 1e-3).estimate(&grid, &state);
        let lut = ColorMap::Hot.lut();
        let frame = synth.synthesize(Band::new(12.0, 15.0), &state, vel, Some(&lut));
        assert_abs_diff_eq!(frame.value(35, 15), 1.6, epsilon = 1e-9);
        let rgb = frame.rgb.unwrap();
        assert_eq!(rgb.len(), frame.field.len());
    }

    #[test]
    fn rejects_bad_config() {
        let grid = ElectrodeGrid::new(8, 4, 2.0, ChannelOrder::ColumnMajor).unwrap();
        let mut cfg = FieldConfig::default();
        cfg.smoothing_kernel = 4;
        assert!(SpatialFieldSynthesizer::new(&cfg, &grid).is_err());
        let mut cfg = FieldConfig::default();
        cfg.height = 0;
        assert!(SpatialFieldSynthesizer::new(&cfg, &grid).is_err());
    }
}
