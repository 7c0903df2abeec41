use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{AnnotateError, AnnotateResult};
use crate::render::frame::VideoFrame;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

/// Sink contract for consuming annotated frames in decode order.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> AnnotateResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &VideoFrame) -> AnnotateResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> AnnotateResult<()>;
    /// Discard whatever was written so far. Called instead of `end` when a run stops early.
    fn abort(&mut self) {}
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, VideoFrame)>,
    ended: bool,
    aborted: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, VideoFrame)] {
        &self.frames
    }

    /// Whether `end` completed.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Whether `abort` was called.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> AnnotateResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &VideoFrame) -> AnnotateResult<()> {
        if self.cfg.is_none() {
            return Err(AnnotateError::codec("in-memory sink not started"));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> AnnotateResult<()> {
        self.ended = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.aborted = true;
        self.frames.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
