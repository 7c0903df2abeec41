use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rayon::prelude::*;

use crate::codec::VideoCodec;
use crate::foundation::error::{AnnotateError, AnnotateResult};
use crate::metadata::MetadataStore;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::frame::{PipelineStats, annotate_video};
use crate::record::model::AnnotationRecord;
use crate::record::parse::parse_row;
use crate::render::overlay::OverlayPainter;
use crate::render::style::OverlayStyle;

/// Default number of trailing stem characters used as the video key.
pub const DEFAULT_KEY_LEN: usize = 12;

/// Options for [`run_batch`].
#[derive(Clone, Debug)]
pub struct BatchOpts {
    /// Directory scanned (non-recursively) for input videos.
    pub input_dir: PathBuf,
    /// Directory receiving annotated videos. Created if missing.
    pub output_dir: PathBuf,
    /// Trailing characters of the file stem that form the video key.
    pub key_len: usize,
    /// Accepted input extensions, compared case-insensitively, without the dot.
    pub extensions: Vec<String>,
    /// Appended to the key to name the output file.
    pub suffix: String,
    /// Output container extension, without the dot.
    pub output_ext: String,
    /// Worker threads; `None` uses the rayon default.
    pub threads: Option<usize>,
}

impl BatchOpts {
    /// Defaults for everything but the two directories.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            key_len: DEFAULT_KEY_LEN,
            extensions: ["mp4", "mov", "avi"].map(str::to_owned).to_vec(),
            suffix: "_annotated".to_owned(),
            output_ext: "mp4".to_owned(),
            threads: None,
        }
    }

    fn validate(&self) -> AnnotateResult<()> {
        if self.key_len == 0 {
            return Err(AnnotateError::validation("key length must be >= 1"));
        }
        if self.output_ext.is_empty() {
            return Err(AnnotateError::validation("output extension must not be empty"));
        }
        Ok(())
    }

    fn accepts(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Key of the video at `path`: the last `key_len` characters of its file stem.
///
/// Shorter stems are used whole. `None` when the path has no usable stem.
pub fn video_key(path: &Path, key_len: usize) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() {
        return None;
    }
    let chars = stem.chars().count();
    Some(stem.chars().skip(chars.saturating_sub(key_len)).collect())
}

/// Output location for the video filed under `key`.
pub fn output_path_for(opts: &BatchOpts, key: &str) -> PathBuf {
    opts.output_dir
        .join(format!("{key}{}.{}", opts.suffix, opts.output_ext))
}

/// An input video selected for processing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Derived video key.
    pub key: String,
    /// Input file.
    pub input: PathBuf,
    /// Earlier input (by path) with the same key. Such a candidate is never processed.
    pub duplicate_of: Option<PathBuf>,
}

/// Files directly under `opts.input_dir` with an accepted extension, sorted by path.
///
/// Keys map to a single output path, so only the first input per key is processed; later ones
/// carry `duplicate_of`.
pub fn list_candidates(opts: &BatchOpts) -> AnnotateResult<Vec<Candidate>> {
    let entries = std::fs::read_dir(&opts.input_dir).with_context(|| {
        format!(
            "failed to read input directory '{}'",
            opts.input_dir.display()
        )
    })?;

    let mut out = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list '{}'", opts.input_dir.display()))?
            .path();
        if !path.is_file() || !opts.accepts(&path) {
            continue;
        }
        if let Some(key) = video_key(&path, opts.key_len) {
            out.push(Candidate {
                key,
                input: path,
                duplicate_of: None,
            });
        }
    }
    out.sort_by(|a, b| a.input.cmp(&b.input));

    let mut first_by_key: HashMap<String, PathBuf> = HashMap::new();
    for candidate in &mut out {
        match first_by_key.get(&candidate.key) {
            Some(first) => candidate.duplicate_of = Some(first.clone()),
            None => {
                first_by_key.insert(candidate.key.clone(), candidate.input.clone());
            }
        }
    }
    Ok(out)
}

/// What happened to one video.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoOutcome {
    /// Written to its output path.
    Annotated {
        /// Frames written.
        frames: u64,
    },
    /// The output file already existed; nothing was opened.
    SkippedExisting,
    /// Another input (the path held here) has the same key and owns the output.
    SkippedDuplicateKey(PathBuf),
    /// The metadata store has no row for the key.
    SkippedNoRecord,
    /// The metadata row could not be parsed.
    SkippedInvalidRecord(String),
    /// Decode, encode or lookup failed.
    Failed(String),
    /// Stopped by a [`CancelToken`] before completion.
    Cancelled,
}

impl VideoOutcome {
    /// Whether the video was skipped without an error.
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            Self::SkippedExisting
                | Self::SkippedDuplicateKey(_)
                | Self::SkippedNoRecord
                | Self::SkippedInvalidRecord(_)
        )
    }
}

/// One line of a [`BatchReport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoReport {
    /// Video key.
    pub key: String,
    /// Input file.
    pub input: PathBuf,
    /// Output file (which may not exist, depending on the outcome).
    pub output: PathBuf,
    /// Result for this video.
    pub outcome: VideoOutcome,
}

/// Per-video outcomes of a batch run, sorted by key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    videos: Vec<VideoReport>,
}

impl BatchReport {
    /// All per-video reports.
    pub fn videos(&self) -> &[VideoReport] {
        &self.videos
    }

    /// Outcome for `key`, if a candidate had that key. With duplicate keys this is the first input.
    pub fn outcome(&self, key: &str) -> Option<&VideoOutcome> {
        self.videos
            .iter()
            .find(|v| v.key == key)
            .map(|v| &v.outcome)
    }

    /// Videos written.
    pub fn annotated(&self) -> usize {
        self.count(|o| matches!(o, VideoOutcome::Annotated { .. }))
    }

    /// Videos skipped without error.
    pub fn skipped(&self) -> usize {
        self.count(VideoOutcome::is_skipped)
    }

    /// Videos that failed.
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, VideoOutcome::Failed(_)))
    }

    /// Videos stopped by cancellation.
    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, VideoOutcome::Cancelled))
    }

    fn count(&self, pred: impl Fn(&VideoOutcome) -> bool) -> usize {
        self.videos.iter().filter(|v| pred(&v.outcome)).count()
    }
}

impl std::fmt::Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} videos: {} annotated, {} skipped, {} failed, {} cancelled",
            self.videos.len(),
            self.annotated(),
            self.skipped(),
            self.failed(),
            self.cancelled()
        )
    }
}

/// Annotate every candidate video under `opts.input_dir`.
///
/// Per-video problems are recorded in the report and never stop the batch. The only errors are
/// invalid options, an unreadable input directory, and an output directory that cannot be created.
/// Inputs sharing a key are processed once; see [`list_candidates`].
#[tracing::instrument(
    skip(store, codec, style, cancel),
    fields(input = %opts.input_dir.display(), output = %opts.output_dir.display())
)]
pub fn run_batch(
    opts: &BatchOpts,
    store: &dyn MetadataStore,
    codec: &dyn VideoCodec,
    style: &OverlayStyle,
    cancel: &CancelToken,
) -> AnnotateResult<BatchReport> {
    opts.validate()?;
    style.validate()?;
    std::fs::create_dir_all(&opts.output_dir).with_context(|| {
        format!(
            "failed to create output directory '{}'",
            opts.output_dir.display()
        )
    })?;

    let candidates = list_candidates(opts)?;
    tracing::info!(videos = candidates.len(), "starting batch");

    let pool = build_thread_pool(opts.threads)?;
    let mut videos: Vec<VideoReport> = pool.install(|| {
        candidates
            .par_iter()
            .map_init(OverlayPainter::new, |painter, candidate| {
                let output = output_path_for(opts, &candidate.key);
                let outcome =
                    process_video(candidate, &output, store, codec, style, cancel, painter);
                VideoReport {
                    key: candidate.key.clone(),
                    input: candidate.input.clone(),
                    output,
                    outcome,
                }
            })
            .collect()
    });
    videos.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.input.cmp(&b.input)));

    let report = BatchReport { videos };
    tracing::info!(summary = %report, "batch finished");
    Ok(report)
}

#[tracing::instrument(skip_all, fields(key = %candidate.key))]
fn process_video(
    candidate: &Candidate,
    output: &Path,
    store: &dyn MetadataStore,
    codec: &dyn VideoCodec,
    style: &OverlayStyle,
    cancel: &CancelToken,
    painter: &mut OverlayPainter,
) -> VideoOutcome {
    if let Some(first) = &candidate.duplicate_of {
        tracing::warn!(first = %first.display(), "duplicate video key, skipping");
        return VideoOutcome::SkippedDuplicateKey(first.clone());
    }
    if cancel.is_cancelled() {
        return VideoOutcome::Cancelled;
    }
    if output.exists() {
        tracing::info!(output = %output.display(), "output exists, skipping");
        return VideoOutcome::SkippedExisting;
    }

    let row = match store.lookup(&candidate.key) {
        Ok(Some(row)) => row,
        Ok(None) => {
            tracing::info!("no metadata row, skipping");
            return VideoOutcome::SkippedNoRecord;
        }
        Err(e) => {
            tracing::warn!(error = %e, "metadata lookup failed");
            return VideoOutcome::Failed(e.to_string());
        }
    };
    tracing::debug!(?row, "matched metadata row");

    let record = match parse_row(row.as_slice()) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(error = %e, "invalid metadata row, skipping");
            return VideoOutcome::SkippedInvalidRecord(e.to_string());
        }
    };

    match encode_video(&candidate.input, output, &record, codec, style, cancel, painter) {
        Ok(stats) => {
            tracing::info!(
                frames = stats.frames,
                output = %output.display(),
                "annotated video"
            );
            tracing::debug!(?stats, "pipeline stats");
            VideoOutcome::Annotated {
                frames: stats.frames,
            }
        }
        Err(AnnotateError::Cancelled) => {
            tracing::info!("cancelled");
            VideoOutcome::Cancelled
        }
        Err(e) => {
            tracing::warn!(error = %e, "video failed");
            VideoOutcome::Failed(e.to_string())
        }
    }
}

fn encode_video(
    input: &Path,
    output: &Path,
    record: &AnnotationRecord,
    codec: &dyn VideoCodec,
    style: &OverlayStyle,
    cancel: &CancelToken,
    painter: &mut OverlayPainter,
) -> AnnotateResult<PipelineStats> {
    let mut source = codec.open(input)?;
    let mut sink = codec.create(output)?;
    annotate_video(
        source.as_mut(),
        sink.as_mut(),
        record,
        painter,
        style,
        cancel,
    )
}

fn build_thread_pool(threads: Option<usize>) -> AnnotateResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(AnnotateError::validation(
            "batch 'threads' must be >= 1 when set",
        ));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| AnnotateError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/batch.rs"]
mod tests;
