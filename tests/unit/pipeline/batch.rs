use super::*;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::media::decode::{FrameSource, InMemorySource};
use crate::media::probe::VideoInfo;
use crate::metadata::InMemoryMetadataStore;
use crate::render::frame::VideoFrame;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "jumpmark_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

type Written = Arc<Mutex<HashMap<PathBuf, Vec<VideoFrame>>>>;

/// Serves white frames for every input and records what each sink received.
struct MemCodec {
    frames: usize,
    opened: AtomicUsize,
    created: AtomicUsize,
    written: Written,
    cancel_after_open: Option<CancelToken>,
}

impl MemCodec {
    fn new(frames: usize) -> Self {
        Self {
            frames,
            opened: AtomicUsize::new(0),
            created: AtomicUsize::new(0),
            written: Arc::default(),
            cancel_after_open: None,
        }
    }

    fn calls(&self) -> (usize, usize) {
        (
            self.opened.load(Ordering::SeqCst),
            self.created.load(Ordering::SeqCst),
        )
    }

    fn frames_for(&self, path: &Path) -> Option<Vec<VideoFrame>> {
        self.written.lock().unwrap().get(path).cloned()
    }
}

impl VideoCodec for MemCodec {
    fn open(&self, path: &Path) -> AnnotateResult<Box<dyn FrameSource>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        if path.to_string_lossy().contains("broken") {
            return Err(AnnotateError::codec("unreadable container"));
        }
        if let Some(cancel) = &self.cancel_after_open {
            cancel.cancel();
        }
        let info = VideoInfo {
            source_path: path.to_owned(),
            width: 64,
            height: 64,
            fps: Fps { num: 30, den: 1 },
            frame_count: Some(self.frames as u64),
        };
        let frames = vec![VideoFrame::filled(64, 64, [255, 255, 255, 255]); self.frames];
        Ok(Box::new(InMemorySource::new(info, frames)))
    }

    fn create(&self, path: &Path) -> AnnotateResult<Box<dyn FrameSink>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FileSink {
            path: path.to_owned(),
            frames: Vec::new(),
            written: Arc::clone(&self.written),
        }))
    }
}

/// Keeps frames in memory and touches the output file on `end`.
struct FileSink {
    path: PathBuf,
    frames: Vec<VideoFrame>,
    written: Written,
}

impl FrameSink for FileSink {
    fn begin(&mut self, _cfg: SinkConfig) -> AnnotateResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, frame: &VideoFrame) -> AnnotateResult<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn end(&mut self) -> AnnotateResult<()> {
        std::fs::write(&self.path, b"annotated").map_err(anyhow::Error::from)?;
        self.written
            .lock()
            .unwrap()
            .insert(self.path.clone(), std::mem::take(&mut self.frames));
        Ok(())
    }
}

fn point(x: i32, y: i32) -> String {
    format!("({x}, {y})")
}

fn row(key: &str, triggers: &str) -> Vec<String> {
    let mut row = vec![String::new(); 22];
    row[0] = key.to_owned();
    row[1] = point(5, 55);
    row[2] = point(55, 55);
    row[3] = "Default Value".to_owned();
    row[4] = point(20, 10);
    row[5] = point(40, 10);
    row[6] = point(10, 30);
    row[7] = point(50, 30);
    row[9] = point(10, 45);
    row[10] = point(30, 35);
    row[20] = triggers.to_owned();
    row[21] = "tester".to_owned();
    row
}

const TRIGGERS: &str = "[0, 0, 10, 20, 30, 40, 50, 60, 70]";

fn setup(name: &str, files: &[&str]) -> BatchOpts {
    let root = temp_dir(name);
    let input = root.join("videos");
    std::fs::create_dir_all(&input).unwrap();
    for f in files {
        std::fs::write(input.join(f), b"").unwrap();
    }
    BatchOpts::new(input, root.join("out"))
}

#[test]
fn video_key_uses_trailing_stem_characters() {
    assert_eq!(
        video_key(Path::new("/v/session3_ATHLETE00001.mp4"), 12).as_deref(),
        Some("ATHLETE00001")
    );
    assert_eq!(video_key(Path::new("short.mov"), 12).as_deref(), Some("short"));
    assert_eq!(video_key(Path::new("abcdef.avi"), 3).as_deref(), Some("def"));
}

#[test]
fn output_path_appends_suffix_and_extension() {
    let opts = BatchOpts::new("in", "out");
    assert_eq!(
        output_path_for(&opts, "ATHLETE00001"),
        Path::new("out").join("ATHLETE00001_annotated.mp4")
    );
}

#[test]
fn candidates_filter_extensions_case_insensitively() {
    let opts = setup(
        "candidates",
        &["a_CLIP00000001.MOV", "b_CLIP00000002.mp4", "notes.txt", "c.avi"],
    );
    std::fs::create_dir_all(opts.input_dir.join("nested.mp4")).unwrap();

    let keys: Vec<String> = list_candidates(&opts)
        .unwrap()
        .into_iter()
        .map(|c| c.key)
        .collect();
    assert_eq!(keys, ["CLIP00000001", "CLIP00000002", "c"]);
}

#[test]
fn annotates_videos_with_records() {
    let opts = setup("annotates", &["x_CLIP00000001.mp4"]);
    let store = InMemoryMetadataStore::from_rows([row("CLIP00000001", TRIGGERS)]);
    let codec = MemCodec::new(25);

    let report = run_batch(
        &opts,
        &store,
        &codec,
        &OverlayStyle::default(),
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(
        report.outcome("CLIP00000001"),
        Some(&VideoOutcome::Annotated { frames: 25 })
    );
    let out = output_path_for(&opts, "CLIP00000001");
    assert!(out.exists());

    let frames = codec.frames_for(&out).unwrap();
    assert_eq!(frames.len(), 25);
    assert_eq!(frames[19].pixel(20, 10), Some([255, 255, 255, 255]));
    let px = frames[20].pixel(20, 10).unwrap();
    assert!(px[0] <= 2 && px[2] >= 253, "{px:?}");
}

#[test]
fn existing_output_is_skipped_without_codec_calls() {
    let opts = setup("existing", &["x_CLIP00000001.mp4"]);
    std::fs::create_dir_all(&opts.output_dir).unwrap();
    let out = output_path_for(&opts, "CLIP00000001");
    std::fs::write(&out, b"previous run").unwrap();

    let store = InMemoryMetadataStore::from_rows([row("CLIP00000001", TRIGGERS)]);
    let codec = MemCodec::new(5);
    let report = run_batch(
        &opts,
        &store,
        &codec,
        &OverlayStyle::default(),
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(
        report.outcome("CLIP00000001"),
        Some(&VideoOutcome::SkippedExisting)
    );
    assert_eq!(codec.calls(), (0, 0));
    assert_eq!(std::fs::read(&out).unwrap(), b"previous run");
}

#[test]
fn bad_trigger_count_skips_video_and_batch_continues() {
    let opts = setup(
        "bad_triggers",
        &["a_CLIP00000001.mp4", "b_CLIP00000002.mp4", "c_CLIP00000003.mp4"],
    );
    let store = InMemoryMetadataStore::from_rows([
        row("CLIP00000001", TRIGGERS),
        row("CLIP00000002", "[0, 0, 10, 20, 30, 40, 50, 60]"),
    ]);
    let codec = MemCodec::new(3);

    let report = run_batch(
        &opts,
        &store,
        &codec,
        &OverlayStyle::default(),
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(
        report.outcome("CLIP00000001"),
        Some(&VideoOutcome::Annotated { frames: 3 })
    );
    assert!(matches!(
        report.outcome("CLIP00000002"),
        Some(VideoOutcome::SkippedInvalidRecord(reason)) if reason.contains("found 8")
    ));
    assert_eq!(
        report.outcome("CLIP00000003"),
        Some(&VideoOutcome::SkippedNoRecord)
    );
    assert_eq!(report.annotated(), 1);
    assert_eq!(report.skipped(), 2);
    assert_eq!(report.failed(), 0);
    assert_eq!(codec.calls(), (1, 1));
    assert!(!output_path_for(&opts, "CLIP00000002").exists());
}

#[test]
fn codec_failure_is_isolated() {
    let opts = setup(
        "codec_failure",
        &["broken_CLIP00000001.mp4", "fine_CLIP00000002.mp4"],
    );
    let store = InMemoryMetadataStore::from_rows([
        row("CLIP00000001", TRIGGERS),
        row("CLIP00000002", TRIGGERS),
    ]);
    let codec = MemCodec::new(2);

    let report = run_batch(
        &opts,
        &store,
        &codec,
        &OverlayStyle::default(),
        &CancelToken::new(),
    )
    .unwrap();

    assert!(matches!(
        report.outcome("CLIP00000001"),
        Some(VideoOutcome::Failed(reason)) if reason.starts_with("codec error:")
    ));
    assert_eq!(
        report.outcome("CLIP00000002"),
        Some(&VideoOutcome::Annotated { frames: 2 })
    );
    assert_eq!(
        report.to_string(),
        "2 videos: 1 annotated, 0 skipped, 1 failed, 0 cancelled"
    );
}

#[test]
fn cancellation_stops_at_frame_boundary() {
    let mut opts = setup("cancel", &["a_CLIP00000001.mp4", "b_CLIP00000002.mp4"]);
    opts.threads = Some(1);
    let store = InMemoryMetadataStore::from_rows([
        row("CLIP00000001", TRIGGERS),
        row("CLIP00000002", TRIGGERS),
    ]);
    let cancel = CancelToken::new();
    let mut codec = MemCodec::new(10);
    codec.cancel_after_open = Some(cancel.clone());

    let report = run_batch(&opts, &store, &codec, &OverlayStyle::default(), &cancel).unwrap();

    assert_eq!(report.cancelled(), 2);
    assert_eq!(report.annotated(), 0);
    // The first video opened before the flag was set; the second never started.
    assert_eq!(codec.calls(), (1, 1));
    assert!(!output_path_for(&opts, "CLIP00000001").exists());
}

#[test]
fn zero_threads_is_rejected() {
    let mut opts = setup("zero_threads", &[]);
    opts.threads = Some(0);
    let err = run_batch(
        &opts,
        &InMemoryMetadataStore::new(),
        &MemCodec::new(1),
        &OverlayStyle::default(),
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, AnnotateError::Validation(_)), "{err}");
}

#[test]
fn missing_input_dir_is_an_error() {
    let root = temp_dir("missing_input");
    let opts = BatchOpts::new(root.join("nope"), root.join("out"));
    let err = run_batch(
        &opts,
        &InMemoryMetadataStore::new(),
        &MemCodec::new(1),
        &OverlayStyle::default(),
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("failed to read input directory"), "{err}");
}

#[test]
fn duplicate_keys_are_processed_once() {
    let mut opts = setup(
        "duplicate_keys",
        &["aa_IMG_0001.mp4", "bb_IMG_0001.MOV", "x.mp4", "x.MOV"],
    );
    opts.key_len = 8;
    opts.threads = Some(2);
    let store = InMemoryMetadataStore::from_rows([row("IMG_0001", TRIGGERS)]);
    let codec = MemCodec::new(5);

    let report = run_batch(
        &opts,
        &store,
        &codec,
        &OverlayStyle::default(),
        &CancelToken::new(),
    )
    .unwrap();

    let input = |name: &str| opts.input_dir.join(name);
    let outcomes: Vec<(PathBuf, VideoOutcome)> = report
        .videos()
        .iter()
        .map(|v| (v.input.clone(), v.outcome.clone()))
        .collect();
    assert_eq!(
        outcomes,
        [
            (
                input("aa_IMG_0001.mp4"),
                VideoOutcome::Annotated { frames: 5 }
            ),
            (
                input("bb_IMG_0001.MOV"),
                VideoOutcome::SkippedDuplicateKey(input("aa_IMG_0001.mp4"))
            ),
            (input("x.MOV"), VideoOutcome::SkippedNoRecord),
            (
                input("x.mp4"),
                VideoOutcome::SkippedDuplicateKey(input("x.MOV"))
            ),
        ]
    );
    assert_eq!(report.annotated(), 1);
    assert_eq!(codec.calls(), (1, 1));
}
