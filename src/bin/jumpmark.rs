use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "jumpmark", version)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Annotate every video in a directory (requires `ffmpeg` and `ffprobe` on PATH).
    Batch(BatchArgs),
    /// Render one annotated frame as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Directory of input videos.
    #[arg(long)]
    videos: PathBuf,

    /// Output directory for annotated videos.
    #[arg(long)]
    out: PathBuf,

    /// Metadata CSV (header row plus one row per video).
    #[arg(long)]
    metadata: PathBuf,

    /// Overlay style JSON.
    #[arg(long)]
    style: Option<PathBuf>,

    /// Worker threads (videos processed in parallel).
    #[arg(long)]
    threads: Option<usize>,

    /// Trailing file-stem characters forming the video key.
    #[arg(long, default_value_t = jumpmark::DEFAULT_KEY_LEN)]
    key_len: usize,

    /// Appended to the key to name each output file.
    #[arg(long, default_value = "_annotated")]
    suffix: String,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input video.
    #[arg(long)]
    video: PathBuf,

    /// Metadata CSV.
    #[arg(long)]
    metadata: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Trailing file-stem characters forming the video key.
    #[arg(long, default_value_t = jumpmark::DEFAULT_KEY_LEN)]
    key_len: usize,

    /// Overlay style JSON.
    #[arg(long)]
    style: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Batch(args) => cmd_batch(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_style(path: Option<&Path>) -> anyhow::Result<jumpmark::OverlayStyle> {
    match path {
        Some(p) => Ok(jumpmark::OverlayStyle::from_path(p)?),
        None => Ok(jumpmark::OverlayStyle::default()),
    }
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let style = load_style(args.style.as_deref())?;
    let store = jumpmark::CsvMetadataStore::from_path(&args.metadata)
        .with_context(|| format!("load metadata '{}'", args.metadata.display()))?;

    let mut opts = jumpmark::BatchOpts::new(&args.videos, &args.out);
    opts.key_len = args.key_len;
    opts.suffix = args.suffix;
    opts.threads = args.threads;

    let report = jumpmark::run_batch(
        &opts,
        &store,
        &jumpmark::FfmpegCodec,
        &style,
        &jumpmark::CancelToken::new(),
    )?;

    for video in report.videos() {
        match &video.outcome {
            jumpmark::VideoOutcome::Failed(reason)
            | jumpmark::VideoOutcome::SkippedInvalidRecord(reason) => {
                eprintln!("{}: {reason}", video.input.display());
            }
            jumpmark::VideoOutcome::SkippedDuplicateKey(first) => {
                eprintln!(
                    "{}: key '{}' already taken by '{}'",
                    video.input.display(),
                    video.key,
                    first.display()
                );
            }
            _ => {}
        }
    }
    println!("{report}");
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let style = load_style(args.style.as_deref())?;
    let store = jumpmark::CsvMetadataStore::from_path(&args.metadata)
        .with_context(|| format!("load metadata '{}'", args.metadata.display()))?;

    let key = jumpmark::video_key(&args.video, args.key_len)
        .with_context(|| format!("no video key in '{}'", args.video.display()))?;
    let row = jumpmark::MetadataStore::lookup(&store, &key)?
        .ok_or_else(|| jumpmark::AnnotateError::not_found(&key))?;
    let record = jumpmark::parse_row(row.as_slice())
        .with_context(|| format!("metadata row for '{key}'"))?;

    let mut source = jumpmark::FfmpegSource::open(&args.video)?;
    let mut painter = jumpmark::OverlayPainter::new();
    let frame = jumpmark::render_preview_frame(
        &mut source,
        &record,
        jumpmark::FrameIndex(args.frame),
        &mut painter,
        &style,
    )?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
