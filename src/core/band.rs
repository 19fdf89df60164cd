//! Band-limited analytic signals, computed once per band and shared read-only.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::butterworth::BandPass;
use crate::core::error::PipelineError;
use crate::core::hilbert::Hilbert;
use crate::core::phase::unwrap_channels;
use crate::core::recording::Recording;

/// Pass-band edges in Hz.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub low_hz: f64,
    pub high_hz: f64,
}

impl Band {
    pub fn new(low_hz: f64, high_hz: f64) -> Self {
        Self { low_hz, high_hz }
    }

    /// `InvalidBand` unless `0 < low < high < fs / 2`.
    pub fn validate(&self, fs: f64) -> Result<(), PipelineError> {
        BandPass::design(self.low_hz, self.high_hz, fs).map(|_| ())
    }

    /// Exact identity used as cache key.
    fn key(&self) -> (u64, u64) {
        (self.low_hz.to_bits(), self.high_hz.to_bits())
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{} Hz", self.low_hz, self.high_hz)
    }
}

/// Per-channel real part and unwrapped phase of one band.
/// Series are indexed from 0; frame index `k` lives at `[k - 1]`.
#[derive(Clone, Debug)]
pub struct AnalyticSignal {
    pub band: Band,
    pub fs: f64,
    real: Vec<Vec<f64>>,
    phase: Vec<Vec<f64>>,
}

impl AnalyticSignal {
    /// Filter, transform and unwrap every channel of `recording`.
    pub fn compute(recording: &Recording, band: Band) -> Result<Self, PipelineError> {
        let fs = recording.sample_rate();
        let filter = BandPass::design(band.low_hz, band.high_hz, fs)?;
        let hilbert = Hilbert::new(recording.frame_count());

        let mut real = Vec::with_capacity(recording.channel_count());
        let mut wrapped: Vec<Vec<f64>> = Vec::with_capacity(recording.channel_count());
        for series in recording.channels() {
            let filtered = filter.filtfilt(series);
            let z = hilbert.analytic(&filtered);
            real.push(z.iter().map(|c| c.re).collect());
            wrapped.push(z.iter().map(|c| c.arg()).collect());
        }
        let phase = unwrap_channels(&wrapped);

        let signal = Self {
            band,
            fs,
            real,
            phase,
        };
        if signal.is_silent() {
            warn!(band = %band, "band-passed signal is identically zero on every channel");
        }
        Ok(signal)
    }

    /// Assemble from precomputed series, e.g. synthetic phase fields.
    pub fn from_parts(
        band: Band,
        fs: f64,
        real: Vec<Vec<f64>>,
        phase: Vec<Vec<f64>>,
    ) -> Result<Self, PipelineError> {
        if !fs.is_finite() || fs <= 0.0 {
            return Err(PipelineError::InvalidSampleRate(fs));
        }
        if real.is_empty() || real[0].is_empty() {
            return Err(PipelineError::EmptyRecording);
        }
        if real.len() != phase.len() {
            return Err(PipelineError::InvalidConfig(format!(
                "{} real channels but {} phase channels",
                real.len(),
                phase.len()
            )));
        }
        let expected = real[0].len();
        for (channel, series) in real.iter().chain(phase.iter()).enumerate() {
            if series.len() != expected {
                return Err(PipelineError::RaggedRecording {
                    channel: channel % real.len(),
                    expected,
                    found: series.len(),
                });
            }
        }
        Ok(Self {
            band,
            fs,
            real,
            phase,
        })
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.real.len()
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.real[0].len()
    }

    #[inline]
    pub fn real(&self, ch: usize) -> &[f64] {
        &self.real[ch]
    }

    #[inline]
    pub fn phase(&self, ch: usize) -> &[f64] {
        &self.phase[ch]
    }

    fn is_silent(&self) -> bool {
        self.real.iter().flatten().all(|&v| v == 0.0)
    }
}

/// Computes analytic signals per band and memoizes them by exact band edges.
#[derive(Default)]
pub struct BandFilterBank {
    cache: HashMap<(u64, u64), Arc<AnalyticSignal>>,
}

impl BandFilterBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached analytic signal for `band`, computing it on first use.
    pub fn analyze(
        &mut self,
        recording: &Recording,
        band: Band,
    ) -> Result<Arc<AnalyticSignal>, PipelineError> {
        if let Some(hit) = self.cache.get(&band.key()) {
            debug!(band = %band, "analytic signal cache hit");
            return Ok(Arc::clone(hit));
        }
        let started = std::time::Instant::now();
        let signal = Arc::new(AnalyticSignal::compute(recording, band)?);
        info!(
            band = %band,
            channels = recording.channel_count(),
            frames = recording.frame_count(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1e3,
            "precomputed analytic signal"
        );
        self.cache.insert(band.key(), Arc::clone(&signal));
        Ok(signal)
    }

    /// Analyze several bands in order; identical bands share one allocation.
    pub fn analyze_all(
        &mut self,
        recording: &Recording,
        bands: &[Band],
    ) -> Result<Vec<Arc<AnalyticSignal>>, PipelineError> {
        bands
            .iter()
            .map(|&band| self.analyze(recording, band))
            .collect()
    }

    pub fn cached_bands(&self) -> usize {
        self.cache.len()
    }
}
