//! Per-video frame loop and the batch driver around it.

/// Batch orchestration across a directory of videos.
pub(crate) mod batch;
/// Cooperative cancellation.
pub(crate) mod cancel;
/// Decode, step, paint and encode one video.
pub(crate) mod frame;
