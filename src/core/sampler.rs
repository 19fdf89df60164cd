//! Fractional-frame sampling of a band's analytic signal.
//!
//! Frame indices are 1-based. `index = k0 + frac` blends samples `k0` and
//! `k1 = min(k0 + 1, frame_count)` linearly; integer indices return stored
//! samples exactly. The phase rate is a backward difference one sample apart,
//! scaled to rad/s, and is zero at `k0 == 1`.

use crate::core::band::AnalyticSignal;
use crate::core::error::PipelineError;

/// Interpolated per-channel state of one band at one query.
#[derive(Clone, Debug, PartialEq)]
pub struct SampledState {
    pub index: f64,
    pub amplitude: Vec<f64>,
    pub phase: Vec<f64>,
    /// rad/s
    pub phase_rate: Vec<f64>,
}

/// Where a query falls between stored frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameBlend {
    /// 1-based lower frame.
    pub k0: usize,
    /// 1-based upper frame, clamped to `frame_count`.
    pub k1: usize,
    pub frac: f64,
}

impl FrameBlend {
    /// Rejects non-finite indices and anything outside `[1, frame_count]`.
    pub fn resolve(index: f64, frame_count: usize) -> Result<Self, PipelineError> {
        if !index.is_finite() || index < 1.0 || index > frame_count as f64 {
            return Err(PipelineError::FrameOutOfRange { index, frame_count });
        }
        let k0 = index.floor() as usize;
        let frac = index - k0 as f64;
        let k1 = (k0 + 1).min(frame_count);
        Ok(Self { k0, k1, frac })
    }

    #[inline]
    fn blend(&self, series: &[f64], shift: usize) -> f64 {
        let a = series[self.k0 - 1 - shift];
        if self.frac == 0.0 {
            return a;
        }
        let b = series[self.k1 - 1 - shift];
        (1.0 - self.frac) * a + self.frac * b
    }
}

pub struct FrameSampler;

impl FrameSampler {
    pub fn sample(signal: &AnalyticSignal, index: f64) -> Result<SampledState, PipelineError> {
        let blend = FrameBlend::resolve(index, signal.frame_count())?;
        let channels = signal.channel_count();
        let mut amplitude = Vec::with_capacity(channels);
        let mut phase = Vec::with_capacity(channels);
        let mut phase_rate = Vec::with_capacity(channels);

        for ch in 0..channels {
            let ph_series = signal.phase(ch);
            let ph = blend.blend(ph_series, 0);
            amplitude.push(blend.blend(signal.real(ch), 0));
            phase.push(ph);
            phase_rate.push(if blend.k0 > 1 {
                (ph - blend.blend(ph_series, 1)) * signal.fs
            } else {
                0.0
            });
        }

        Ok(SampledState {
            index,
            amplitude,
            phase,
            phase_rate,
        })
    }
}
