use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{AnnotateError, AnnotateResult};
use crate::media::decode::FrameSource;
use crate::pipeline::cancel::CancelToken;
use crate::record::model::AnnotationRecord;
use crate::render::frame::VideoFrame;
use crate::render::overlay::OverlayPainter;
use crate::render::style::OverlayStyle;
use crate::trigger::state::TriggerState;

/// Counters reported by [`annotate_video`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Frames decoded, annotated and written.
    pub frames: u64,
    /// First frame on which the stride group was fully visible.
    pub stride_latched_at: Option<FrameIndex>,
    /// First frame on which the takeoff/landing group was visible.
    pub jump_latched_at: Option<FrameIndex>,
    /// First frame on which the angle group was visible.
    pub angle_latched_at: Option<FrameIndex>,
}

/// Decode every frame of `source`, draw the overlays due on it, and write it to `sink`.
///
/// The sink is configured with the source's size and frame rate. Frames are handled strictly in
/// decode order with one [`TriggerState`] for the whole run. On any error or cancellation the
/// sink is aborted.
#[tracing::instrument(skip_all, fields(key = %record.key))]
pub fn annotate_video(
    source: &mut dyn FrameSource,
    sink: &mut dyn FrameSink,
    record: &AnnotationRecord,
    painter: &mut OverlayPainter,
    style: &OverlayStyle,
    cancel: &CancelToken,
) -> AnnotateResult<PipelineStats> {
    let info = source.info().clone();
    sink.begin(SinkConfig {
        width: info.width,
        height: info.height,
        fps: info.fps,
    })?;

    match run_frames(source, sink, record, painter, style, cancel) {
        Ok(stats) => {
            sink.end()?;
            tracing::debug!(frames = stats.frames, "video annotated");
            Ok(stats)
        }
        Err(e) => {
            sink.abort();
            Err(e)
        }
    }
}

fn run_frames(
    source: &mut dyn FrameSource,
    sink: &mut dyn FrameSink,
    record: &AnnotationRecord,
    painter: &mut OverlayPainter,
    style: &OverlayStyle,
    cancel: &CancelToken,
) -> AnnotateResult<PipelineStats> {
    let info = source.info();
    let mut frame = VideoFrame::black(info.width, info.height);
    let mut state = TriggerState::new();
    let mut stats = PipelineStats::default();
    let mut idx = FrameIndex(0);

    loop {
        if cancel.is_cancelled() {
            return Err(AnnotateError::Cancelled);
        }
        if !source.read_frame(&mut frame)? {
            break;
        }

        let plan = state.step(idx, record);
        painter.paint(&mut frame, &plan, style)?;
        sink.push_frame(idx, &frame)?;

        record_latches(&mut stats, &state, idx);
        stats.frames += 1;
        idx = idx.next();
    }
    Ok(stats)
}

fn record_latches(stats: &mut PipelineStats, state: &TriggerState, idx: FrameIndex) {
    if state.stride_latched() && stats.stride_latched_at.is_none() {
        stats.stride_latched_at = Some(idx);
    }
    if state.jump_latched() && stats.jump_latched_at.is_none() {
        stats.jump_latched_at = Some(idx);
    }
    if state.angle_latched() && stats.angle_latched_at.is_none() {
        stats.angle_latched_at = Some(idx);
    }
}

/// Decode up to frame `target` and return it with its overlays drawn.
///
/// Every earlier frame is stepped through the state machine (so latches match a full run) but
/// not painted.
pub fn render_preview_frame(
    source: &mut dyn FrameSource,
    record: &AnnotationRecord,
    target: FrameIndex,
    painter: &mut OverlayPainter,
    style: &OverlayStyle,
) -> AnnotateResult<VideoFrame> {
    let info = source.info();
    let mut frame = VideoFrame::black(info.width, info.height);
    let mut state = TriggerState::new();
    let mut idx = FrameIndex(0);

    loop {
        if !source.read_frame(&mut frame)? {
            return Err(AnnotateError::validation(format!(
                "frame {} is past the end of the video ({} frames)",
                target.0, idx.0
            )));
        }
        let plan = state.step(idx, record);
        if idx == target {
            painter.paint(&mut frame, &plan, style)?;
            return Ok(frame);
        }
        idx = idx.next();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/frame.rs"]
mod tests;
