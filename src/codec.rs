//! Video container decode/encode boundary.

use std::path::Path;

use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::FrameSink;
use crate::foundation::error::AnnotateResult;
use crate::media::decode::{FfmpegSource, FrameSource};

/// Opens sources and creates sinks for the batch driver.
///
/// Shared across worker threads, so implementations must be `Sync`.
pub trait VideoCodec: Sync {
    /// Open `path` for decoding. The source reports fps and dimensions through its info.
    fn open(&self, path: &Path) -> AnnotateResult<Box<dyn FrameSource>>;

    /// Create a sink writing to `path`; size and frame rate arrive in `FrameSink::begin`.
    fn create(&self, path: &Path) -> AnnotateResult<Box<dyn FrameSink>>;
}

/// [`VideoCodec`] backed by the system `ffmpeg`/`ffprobe` binaries.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegCodec;

impl VideoCodec for FfmpegCodec {
    fn open(&self, path: &Path) -> AnnotateResult<Box<dyn FrameSource>> {
        Ok(Box::new(FfmpegSource::open(path)?))
    }

    fn create(&self, path: &Path) -> AnnotateResult<Box<dyn FrameSink>> {
        Ok(Box::new(FfmpegSink::new(FfmpegSinkOpts::new(path))))
    }
}
