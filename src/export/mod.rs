//! Binary-side collaborators: recording loader and PNG frame sink.

pub mod png;
pub mod wav;
pub mod writer;
