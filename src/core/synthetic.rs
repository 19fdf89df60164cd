//! Synthetic electrode recordings for demos, tests and benches.

use serde::{Deserialize, Serialize};

use crate::core::error::PipelineError;
use crate::core::grid::ElectrodeGrid;
use crate::core::recording::Recording;
use crate::core::util::{sine, white_noise};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyntheticKind {
    /// Same sinusoid on every channel.
    InPhase,
    /// Plane wave travelling along +x.
    Traveling,
    /// Independent uniform noise per channel.
    Noise,
}

/// Parameters shared by the generators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SyntheticSpec {
    pub sample_rate: f64,
    pub frames: usize,
    pub freq_hz: f64,
    /// Spatial phase gradient in rad per physical unit.
    pub wavenumber: f64,
    pub seed: u64,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            sample_rate: 1000.0,
            frames: 1000,
            freq_hz: 13.0,
            wavenumber: 0.4,
            seed: 7,
        }
    }
}

impl SyntheticKind {
    pub fn generate(self, grid: &ElectrodeGrid, spec: &SyntheticSpec) -> Result<Recording, PipelineError> {
        match self {
            SyntheticKind::InPhase => in_phase(grid, spec),
            SyntheticKind::Traveling => traveling_wave(grid, spec),
            SyntheticKind::Noise => noise(grid, spec),
        }
    }
}

pub fn in_phase(grid: &ElectrodeGrid, spec: &SyntheticSpec) -> Result<Recording, PipelineError> {
    let series = sine(spec.sample_rate, spec.freq_hz, spec.frames, 0.0);
    Recording::new(spec.sample_rate, vec![series; grid.channel_count()])
}

/// `cos(w t + k x + c)` per channel, with `c` centering the initial phases
/// on zero so they stay inside `(-PI, PI]` while `k * width <= 2 PI`.
pub fn traveling_wave(grid: &ElectrodeGrid, spec: &SyntheticSpec) -> Result<Recording, PipelineError> {
    let (x0, x1, _, _) = grid.extent();
    let center = 0.5 * (x0 + x1) * spec.wavenumber;
    let quarter = std::f64::consts::FRAC_PI_2;
    let samples = (0..grid.channel_count())
        .map(|ch| {
            let (x, _) = grid.position(ch);
            sine(
                spec.sample_rate,
                spec.freq_hz,
                spec.frames,
                spec.wavenumber * x - center + quarter,
            )
        })
        .collect();
    Recording::new(spec.sample_rate, samples)
}

pub fn noise(grid: &ElectrodeGrid, spec: &SyntheticSpec) -> Result<Recording, PipelineError> {
    let samples = (0..grid.channel_count())
        .map(|ch| white_noise(spec.frames, spec.seed.wrapping_add(ch as u64)))
        .collect();
    Recording::new(spec.sample_rate, samples)
}
