//! Session context and per-frame driver.
//!
//! A [`Session`] owns the recording, grid, configuration and the precomputed
//! per-band analytic signals; nothing in it changes after construction.
//! [`FrameSequencer::compute_frame`] is a pure function of the session and
//! the query index, so repeated queries return identical frames.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::core::band::{AnalyticSignal, Band, BandFilterBank};
use crate::core::colormap::{ColorLut, ColorMap};
use crate::core::error::PipelineError;
use crate::core::field::{FieldConfig, FieldMode, RenderableFrame, SpatialFieldSynthesizer};
use crate::core::grid::ElectrodeGrid;
use crate::core::recording::Recording;
use crate::core::sampler::{FrameBlend, FrameSampler};
use crate::core::timebase::Timebase;
use crate::core::velocity::VelocityFieldEstimator;

/// Library-side pipeline settings.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    pub bands: Vec<Band>,
    /// One per band; required in stacked mode.
    pub colormaps: Vec<ColorMap>,
    pub field: FieldConfig,
    /// Gradient regularisation added to `|grad|^2`.
    pub epsilon: f64,
    /// Compute bands of one frame on scoped worker threads.
    pub parallel_bands: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bands: vec![Band::new(12.0, 15.0)],
            colormaps: vec![ColorMap::Viridis],
            field: FieldConfig::default(),
            epsilon: 1e-3,
            parallel_bands: false,
        }
    }
}

impl PipelineConfig {
    /// Checks everything that does not depend on the recording.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "epsilon must be finite and positive, got {}",
                self.epsilon
            )));
        }
        self.field.validate()?;
        if self.field.mode == FieldMode::Stacked {
            if self.colormaps.len() != self.bands.len() {
                return Err(PipelineError::InvalidConfig(format!(
                    "stacked mode needs one colormap per band ({} bands, {} colormaps)",
                    self.bands.len(),
                    self.colormaps.len()
                )));
            }
            let mut seen = HashSet::new();
            for map in &self.colormaps {
                if !seen.insert(*map) {
                    return Err(PipelineError::InvalidConfig(format!(
                        "colormap {map} used by more than one band"
                    )));
                }
            }
        }
        Ok(())
    }
}

pub struct Session {
    recording: Recording,
    grid: ElectrodeGrid,
    config: PipelineConfig,
    signals: Vec<Arc<AnalyticSignal>>,
}

impl Session {
    /// Validates the setup and precomputes every band before returning.
    pub fn new(
        recording: Recording,
        grid: ElectrodeGrid,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        grid.check_channel_count(recording.channel_count())?;
        config.validate()?;
        for band in &config.bands {
            band.validate(recording.sample_rate())?;
        }

        let started = Instant::now();
        let mut bank = BandFilterBank::new();
        let signals = bank.analyze_all(&recording, &config.bands)?;
        info!(
            bands = config.bands.len(),
            distinct = bank.cached_bands(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1e3,
            "session ready"
        );

        Ok(Self {
            recording,
            grid,
            config,
            signals,
        })
    }

    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    pub fn grid(&self) -> &ElectrodeGrid {
        &self.grid
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn signal(&self, band: usize) -> &AnalyticSignal {
        &self.signals[band]
    }

    pub fn band_count(&self) -> usize {
        self.signals.len()
    }

    pub fn timebase(&self) -> Timebase {
        self.recording.timebase()
    }

    pub fn frame_count(&self) -> usize {
        self.recording.frame_count()
    }
}

/// All bands of one frame query.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSet {
    pub index: f64,
    /// Playback time `(index - 1) / fs`.
    pub t0: f64,
    pub frames: Vec<RenderableFrame>,
}

/// Monotone frame indices `start, start + step, ...` not exceeding `end`.
#[derive(Clone, Debug)]
pub struct FrameIndices {
    start: f64,
    end: f64,
    step: f64,
    count: usize,
    next: usize,
}

impl Iterator for FrameIndices {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.next >= self.count {
            return None;
        }
        // `start + n * step` can round past `end` on the last index.
        let v = (self.start + self.next as f64 * self.step).min(self.end);
        self.next += 1;
        Some(v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.count - self.next;
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for FrameIndices {}

pub struct FrameSequencer {
    session: Session,
    estimator: VelocityFieldEstimator,
    synthesizer: SpatialFieldSynthesizer,
    luts: Vec<Option<ColorLut>>,
}

impl FrameSequencer {
    pub fn new(session: Session) -> Result<Self, PipelineError> {
        let config = session.config();
        let estimator = VelocityFieldEstimator::new(config.epsilon, session.timebase().dt());
        let synthesizer = SpatialFieldSynthesizer::new(&config.field, session.grid())?;
        let luts = (0..session.band_count())
            .map(|b| match config.field.mode {
                FieldMode::Stacked => config.colormaps.get(b).map(|m| m.lut()),
                FieldMode::Scalar => None,
            })
            .collect();
        Ok(Self {
            session,
            estimator,
            synthesizer,
            luts,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn synthesizer(&self) -> &SpatialFieldSynthesizer {
        &self.synthesizer
    }

    /// Either every band succeeds or the whole query fails.
    pub fn compute_frame(&self, index: f64) -> Result<FrameSet, PipelineError> {
        FrameBlend::resolve(index, self.session.frame_count())?;
        let started = Instant::now();
        let bands = self.session.band_count();

        let frames = if self.session.config.parallel_bands && bands > 1 {
            std::thread::scope(|s| {
                let handles: Vec<_> = (0..bands)
                    .map(|b| s.spawn(move || self.compute_band(b, index)))
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                    .collect::<Result<Vec<_>, _>>()
            })?
        } else {
            (0..bands)
                .map(|b| self.compute_band(b, index))
                .collect::<Result<Vec<_>, _>>()?
        };

        debug!(
            index,
            bands,
            elapsed_ms = started.elapsed().as_secs_f64() * 1e3,
            "frame computed"
        );
        Ok(FrameSet {
            index,
            t0: self.session.timebase().index_to_sec(index),
            frames,
        })
    }

    fn compute_band(&self, b: usize, index: f64) -> Result<RenderableFrame, PipelineError> {
        let signal = self.session.signal(b);
        let state = FrameSampler::sample(signal, index)?;
        let velocity = self.estimator.estimate(self.session.grid(), &state);
        debug!(
            band = %signal.band,
            max_speed = velocity.max_speed(),
            mean_speed = velocity.mean_speed(),
            "velocity"
        );
        Ok(self
            .synthesizer
            .synthesize(signal.band, &state, velocity, self.luts[b].as_ref()))
    }

    /// Export sequence. Both ends must be valid frame indices and `step > 0`.
    /// Every yielded index lies in `[start, end]`.
    pub fn frame_indices(&self, start: f64, end: f64, step: f64) -> Result<FrameIndices, PipelineError> {
        let frame_count = self.session.frame_count();
        FrameBlend::resolve(start, frame_count)?;
        FrameBlend::resolve(end, frame_count)?;
        if !step.is_finite() || step <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "frame step must be finite and positive, got {step}"
            )));
        }
        let count = if end < start {
            0
        } else {
            ((end - start) / step + 1e-9).floor() as usize + 1
        };
        Ok(FrameIndices {
            start,
            end,
            step,
            count,
            next: 0,
        })
    }

    /// `index + delta`, or a range error. Never clamps.
    pub fn scrub(&self, index: f64, delta: f64) -> Result<f64, PipelineError> {
        let target = index + delta;
        FrameBlend::resolve(target, self.session.frame_count())?;
        Ok(target)
    }
}
