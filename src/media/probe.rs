use std::path::{Path, PathBuf};

use crate::foundation::core::Fps;
use crate::foundation::error::{AnnotateError, AnnotateResult};

/// Basic metadata about a source video file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoInfo {
    /// Source path used for probing/decoding.
    pub source_path: PathBuf,
    /// Width in pixels, in display orientation (after rotation metadata is applied).
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Native frame rate.
    pub fps: Fps,
    /// Frame count reported by the container, when known.
    pub frame_count: Option<u64>,
}

/// Probe source video metadata through `ffprobe`.
pub fn probe_video(source_path: &Path) -> AnnotateResult<VideoInfo> {
    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-print_format",
            "json",
            "-show_streams",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| AnnotateError::codec(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(AnnotateError::codec(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe_json(source_path, &out.stdout)
}

pub(crate) fn parse_probe_json(source_path: &Path, json: &[u8]) -> AnnotateResult<VideoInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
        avg_frame_rate: Option<String>,
        nb_frames: Option<String>,
        #[serde(default)]
        tags: ProbeTags,
        #[serde(default)]
        side_data_list: Vec<ProbeSideData>,
    }
    #[derive(serde::Deserialize, Default)]
    struct ProbeTags {
        rotate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeSideData {
        rotation: Option<f64>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
    }

    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| AnnotateError::codec(format!("ffprobe json parse failed: {e}")))?;
    let stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            AnnotateError::codec(format!(
                "no video stream found in '{}'",
                source_path.display()
            ))
        })?;
    let width = stream
        .width
        .filter(|&w| w > 0)
        .ok_or_else(|| AnnotateError::codec("missing video width from ffprobe"))?;
    let height = stream
        .height
        .filter(|&h| h > 0)
        .ok_or_else(|| AnnotateError::codec("missing video height from ffprobe"))?;

    // ffmpeg auto-rotates while decoding, so frames arrive in display orientation.
    let rotation = stream
        .side_data_list
        .iter()
        .find_map(|sd| sd.rotation)
        .or_else(|| {
            stream
                .tags
                .rotate
                .as_deref()
                .and_then(|r| r.trim().parse::<f64>().ok())
        })
        .unwrap_or(0.0);
    let (width, height) = if quarter_turn(rotation) {
        (height, width)
    } else {
        (width, height)
    };

    // `r_frame_rate` is `0/0` for some containers; fall back to the average rate.
    let fps = [&stream.r_frame_rate, &stream.avg_frame_rate]
        .into_iter()
        .flatten()
        .find_map(|r| Fps::parse_ratio(r).ok())
        .ok_or_else(|| {
            AnnotateError::codec(format!(
                "no usable frame rate for '{}'",
                source_path.display()
            ))
        })?;

    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.trim().parse::<u64>().ok());

    Ok(VideoInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        fps,
        frame_count,
    })
}

fn quarter_turn(degrees: f64) -> bool {
    let turns = (degrees / 90.0).round() as i64;
    turns.rem_euclid(2) == 1
}

/// Return `true` when both `ffmpeg` and `ffprobe` can be invoked from `PATH`.
pub fn ffmpeg_tools_available() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|tool| {
        std::process::Command::new(tool)
            .arg("-version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    })
}

#[cfg(test)]
#[path = "../../tests/unit/media/probe.rs"]
mod tests;
