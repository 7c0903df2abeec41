use super::*;

#[test]
fn odd_dimensions_keep_full_chroma() {
    assert_eq!(output_pix_fmt(1920, 1080), "yuv420p");
    assert_eq!(output_pix_fmt(1921, 1080), "yuv444p");
    assert_eq!(output_pix_fmt(640, 361), "yuv444p");
}

#[test]
fn begin_rejects_invalid_config_before_spawning() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("target/ffmpeg_sink_unit/zero.mp4"));
    let err = sink
        .begin(SinkConfig {
            width: 0,
            height: 10,
            fps: Fps { num: 30, den: 1 },
        })
        .unwrap_err();
    assert!(matches!(err, AnnotateError::Validation(_)));
}

#[test]
fn begin_refuses_to_overwrite_existing_output() {
    let dir = PathBuf::from("target").join("ffmpeg_sink_unit");
    std::fs::create_dir_all(&dir).unwrap();
    let out = dir.join("existing.mp4");
    std::fs::write(&out, b"keep me").unwrap();

    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&out));
    let err = sink
        .begin(SinkConfig {
            width: 4,
            height: 4,
            fps: Fps { num: 30, den: 1 },
        })
        .unwrap_err();
    assert!(err.to_string().contains("already exists"));
    drop(sink);
    assert_eq!(std::fs::read(&out).unwrap(), b"keep me");
}

#[test]
fn push_before_begin_is_an_error() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("target/ffmpeg_sink_unit/never.mp4"));
    assert!(
        sink.push_frame(FrameIndex(0), &VideoFrame::black(2, 2))
            .is_err()
    );
    assert!(sink.end().is_err());
}
