//! Jumpmark burns measurement overlays into long-jump videos.
//!
//! Every video is matched by key to a metadata row holding measured points and nine trigger frame
//! indices. While the video is re-encoded, overlays appear frame by frame:
//!
//! - the scale reference on every frame
//! - stride markers, revealed in stages and then latched
//! - the takeoff/landing line once both are reached
//! - the angle reference once both of its points are reached
//!
//! Entry points are [`run_batch`] for a directory of videos, [`annotate_video`] for one
//! source/sink pair, and [`step`] for the visibility state machine on its own.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod codec;
pub(crate) mod encode;
pub(crate) mod media;
pub(crate) mod metadata;
pub(crate) mod pipeline;
pub(crate) mod record;
pub(crate) mod render;
pub(crate) mod trigger;

pub use crate::foundation::core::{Fps, FrameIndex, Point, Rgba8};
pub use crate::foundation::error::{AnnotateError, AnnotateResult, ParseError};

pub use crate::record::model::{
    ABSENT_SENTINEL, AnnotationRecord, StrideGroup, TRIGGER_COUNT, Triggers, fields, slots,
};
pub use crate::record::parse::parse_row;

pub use crate::trigger::state::{GroupPhase, OverlayPlan, TriggerState, step};

pub use crate::render::frame::VideoFrame;
pub use crate::render::overlay::{
    OverlayPainter, draw_angle_line, draw_jump_line, draw_scale_line, draw_stride_markers,
};
pub use crate::render::style::OverlayStyle;

pub use crate::codec::{FfmpegCodec, VideoCodec};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_parent_dir};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::media::decode::{FfmpegSource, FrameSource, InMemorySource};
pub use crate::media::probe::{VideoInfo, ffmpeg_tools_available, probe_video};
pub use crate::metadata::{CsvMetadataStore, InMemoryMetadataStore, MetadataStore};

pub use crate::pipeline::batch::{
    BatchOpts, BatchReport, Candidate, DEFAULT_KEY_LEN, VideoOutcome, VideoReport,
    list_candidates, output_path_for, run_batch, video_key,
};
pub use crate::pipeline::cancel::CancelToken;
pub use crate::pipeline::frame::{PipelineStats, annotate_video, render_preview_frame};
