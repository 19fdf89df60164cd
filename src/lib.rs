//! Phase-gradient wave-field reconstruction for electrode-grid recordings.
//!
//! A recording is band-passed and turned into per-channel analytic signals
//! once per band; each frame query then samples amplitude and phase,
//! estimates an apparent velocity from the phase gradient, advects the
//! channel positions and reconstructs a smoothed dense field.

pub mod config;
pub mod core;

pub use crate::core::band::{AnalyticSignal, Band, BandFilterBank};
pub use crate::core::colormap::{ColorLut, ColorMap};
pub use crate::core::error::PipelineError;
pub use crate::core::field::{FieldConfig, FieldMode, Marker, RenderableFrame, SpatialFieldSynthesizer};
pub use crate::core::grid::{ChannelOrder, ElectrodeGrid};
pub use crate::core::recording::Recording;
pub use crate::core::sampler::{FrameSampler, SampledState};
pub use crate::core::sequencer::{FrameSequencer, FrameSet, PipelineConfig, Session};
pub use crate::core::velocity::{VelocityField, VelocityFieldEstimator};
