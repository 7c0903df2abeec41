//! Encoding sinks.
//!
//! Sinks consume annotated frames in decode order and are fed by the frame pipeline.

/// `ffmpeg`-based sink (MP4 output via system `ffmpeg`).
pub(crate) mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub(crate) mod sink;
