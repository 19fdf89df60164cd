pub mod band;
pub mod butterworth;
pub mod colormap;
pub mod error;
pub mod field;
pub mod grid;
pub mod hilbert;
pub mod hull;
pub mod interp;
pub mod phase;
pub mod recording;
pub mod sampler;
pub mod sequencer;
pub mod smoothing;
pub mod synthetic;
pub mod timebase;
pub mod util;
pub mod velocity;
