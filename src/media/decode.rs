use std::collections::VecDeque;
use std::io::Read;
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::foundation::error::{AnnotateError, AnnotateResult};
use crate::media::probe::{VideoInfo, probe_video};
use crate::render::frame::{VideoFrame, byte_len};

/// Source of decoded frames in decode order.
pub trait FrameSource: Send {
    /// Stream metadata (dimensions, native frame rate).
    fn info(&self) -> &VideoInfo;

    /// Decode the next frame into `frame`, resizing it if needed.
    ///
    /// Returns `Ok(false)` once the stream is exhausted.
    fn read_frame(&mut self, frame: &mut VideoFrame) -> AnnotateResult<bool>;
}

/// In-memory source for tests and debugging.
#[derive(Debug)]
pub struct InMemorySource {
    info: VideoInfo,
    frames: VecDeque<VideoFrame>,
}

impl InMemorySource {
    /// Serve `frames` in order, described by `info`.
    pub fn new(info: VideoInfo, frames: Vec<VideoFrame>) -> Self {
        Self {
            info,
            frames: frames.into(),
        }
    }
}

impl FrameSource for InMemorySource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn read_frame(&mut self, frame: &mut VideoFrame) -> AnnotateResult<bool> {
        match self.frames.pop_front() {
            Some(next) => {
                *frame = next;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Streams raw RGBA frames out of a system `ffmpeg` process.
pub struct FfmpegSource {
    info: VideoInfo,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl FfmpegSource {
    /// Probe `path` and start decoding it.
    pub fn open(path: &Path) -> AnnotateResult<Self> {
        let info = probe_video(path)?;

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.args(["-v", "error", "-nostdin", "-i"])
            .arg(path)
            .args([
                "-map",
                "0:v:0",
                "-an",
                "-sn",
                "-fps_mode",
                "passthrough",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ]);

        let mut child = cmd.spawn().map_err(|e| {
            AnnotateError::codec(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AnnotateError::codec("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| AnnotateError::codec("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            fps = %info.fps,
            "opened video for decoding"
        );

        Ok(Self {
            info,
            child: Some(child),
            stdout: Some(stdout),
            stderr_drain: Some(stderr_drain),
        })
    }

    fn finish(&mut self) -> AnnotateResult<()> {
        drop(self.stdout.take());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait().map_err(|e| {
            AnnotateError::codec(format!("failed to wait for ffmpeg decoder: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| AnnotateError::codec("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| AnnotateError::codec(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        if !status.success() {
            return Err(AnnotateError::codec(format!(
                "ffmpeg decode of '{}' exited with status {}: {}",
                self.info.source_path.display(),
                status,
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        Ok(())
    }
}

impl FrameSource for FfmpegSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn read_frame(&mut self, frame: &mut VideoFrame) -> AnnotateResult<bool> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(false);
        };

        let expected = byte_len(self.info.width, self.info.height);
        frame.width = self.info.width;
        frame.height = self.info.height;
        frame.data.resize(expected, 0);

        let filled = read_full(stdout, &mut frame.data).map_err(|e| {
            AnnotateError::codec(format!("failed to read decoded frame from ffmpeg: {e}"))
        })?;
        if filled == 0 {
            self.finish()?;
            return Ok(false);
        }
        if filled < expected {
            self.finish()?;
            return Err(AnnotateError::codec(format!(
                "truncated frame from ffmpeg: got {filled} bytes, expected {expected}"
            )));
        }
        Ok(true)
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
#[path = "../../tests/unit/media/decode.rs"]
mod tests;
