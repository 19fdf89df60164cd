use crate::core::error::PipelineError;

/// Sample clock of a recording. Frame indices are 1-based and may be fractional.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timebase {
    pub fs: f64,
}

impl Timebase {
    pub fn new(fs: f64) -> Result<Self, PipelineError> {
        if !fs.is_finite() || fs <= 0.0 {
            return Err(PipelineError::InvalidSampleRate(fs));
        }
        Ok(Self { fs })
    }

    /// Seconds between adjacent samples.
    #[inline]
    pub fn dt(&self) -> f64 {
        1.0 / self.fs
    }

    #[inline]
    pub fn nyquist(&self) -> f64 {
        0.5 * self.fs
    }

    /// Playback time of a frame index: `(index - 1) / fs`.
    #[inline]
    pub fn index_to_sec(&self, index: f64) -> f64 {
        (index - 1.0) / self.fs
    }
}
