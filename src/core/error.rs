//! Error taxonomy for the frame pipeline.
//!
//! Two families reach callers: configuration errors (fatal at setup) and
//! frame range errors (rejected per call). Numeric degeneracies are absorbed
//! inside the pipeline and never show up here.

use std::fmt;

/// Errors returned by pipeline construction and frame requests.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Band bounds are inverted or outside `(0, nyquist)`.
    InvalidBand {
        low_hz: f64,
        high_hz: f64,
        nyquist_hz: f64,
    },
    /// Sample rate is non-finite or not positive.
    InvalidSampleRate(f64),
    /// Recording channel count does not match `columns * rows`.
    ChannelCountMismatch {
        channels: usize,
        columns: usize,
        rows: usize,
    },
    /// Lattice dimensions, pitch or channel map are unusable.
    InvalidGrid(String),
    /// A channel's series length differs from channel 0.
    RaggedRecording {
        channel: usize,
        expected: usize,
        found: usize,
    },
    /// No channels or no samples.
    EmptyRecording,
    /// Frame query outside `[1, frame_count]` (or not finite).
    FrameOutOfRange { index: f64, frame_count: usize },
    /// Any other invalid setting.
    InvalidConfig(String),
}

impl PipelineError {
    /// True for the configuration family (everything except range errors).
    pub fn is_configuration(&self) -> bool {
        !matches!(self, PipelineError::FrameOutOfRange { .. })
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::InvalidBand {
                low_hz,
                high_hz,
                nyquist_hz,
            } => write!(
                f,
                "invalid band {low_hz}..{high_hz} Hz (need 0 < low < high < {nyquist_hz} Hz)"
            ),
            PipelineError::InvalidSampleRate(fs) => {
                write!(f, "sample rate must be finite and positive, got {fs}")
            }
            PipelineError::ChannelCountMismatch {
                channels,
                columns,
                rows,
            } => write!(
                f,
                "recording has {channels} channels but grid is {columns}x{rows} ({} cells)",
                columns * rows
            ),
            PipelineError::InvalidGrid(msg) => write!(f, "invalid electrode grid: {msg}"),
            PipelineError::RaggedRecording {
                channel,
                expected,
                found,
            } => write!(
                f,
                "channel {channel} has {found} samples, expected {expected}"
            ),
            PipelineError::EmptyRecording => write!(f, "recording has no channels or no samples"),
            PipelineError::FrameOutOfRange { index, frame_count } => {
                write!(f, "frame index {index} outside [1, {frame_count}]")
            }
            PipelineError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for PipelineError {}
