use framegate_common::config::CompressionConfig;
use framegate_common::Frame;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use tracing::{debug, error, info, warn};

use crate::sink::FrameSink;

#[derive(Debug, thiserror::Error)]
pub enum EncoderError {
    #[error("failed to spawn ffmpeg: {0}")]
    Spawn(String),
    #[error("failed to write frame to ffmpeg stdin: {0}")]
    Write(String),
    #[error("failed to wait for ffmpeg: {0}")]
    Wait(String),
    #[error("ffmpeg exited with non-zero status: {0}")]
    FfmpegFailed(String),
}

struct Running {
    child: Child,
    stdin: ChildStdin,
    width: u32,
    height: u32,
}

/// Encodes frames to a video file through an ffmpeg subprocess fed rgb24
/// rawvideo on stdin.
///
/// ffmpeg is spawned on the first frame, since the raw stream needs the frame
/// size up front. Every later frame must have the same size. Output is
/// written at a constant `fps`, so the file plays `frames / fps` seconds no
/// matter where the frames came from in the source.
pub struct FfmpegEncoder {
    output_path: PathBuf,
    fps: f64,
    vcodec: &'static str,
    crf: u32,
    preset: String,
    running: Option<Running>,
    frame_count: u64,
}

impl FfmpegEncoder {
    pub fn new(output_path: impl Into<PathBuf>, fps: f64, config: &CompressionConfig) -> Self {
        let vcodec = match config.codec.as_str() {
            "h265" => "libx265",
            _ => "libx264",
        };
        Self {
            output_path: output_path.into(),
            fps,
            vcodec,
            crf: config.crf,
            preset: config.preset.clone(),
            running: None,
            frame_count: 0,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn args(&self, width: u32, height: u32) -> Vec<String> {
        let size = format!("{width}x{height}");
        let fps = self.fps.to_string();
        let crf = self.crf.to_string();
        let path = self.output_path.to_string_lossy();
        [
            "-v", "error",
            "-f", "rawvideo",
            "-pix_fmt", "rgb24",
            "-s", size.as_str(),
            "-r", fps.as_str(),
            "-i", "pipe:0",
            "-c:v", self.vcodec,
            "-preset", self.preset.as_str(),
            "-crf", crf.as_str(),
            "-pix_fmt", "yuv420p",
            "-movflags", "+faststart",
            "-y",
            &*path,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn start(&mut self, width: u32, height: u32) -> Result<(), EncoderError> {
        let mut child = Command::new("ffmpeg")
            .args(self.args(width, height))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| EncoderError::Spawn(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EncoderError::Spawn("could not get stdin handle".into()))?;

        debug!(
            codec = self.vcodec,
            crf = self.crf,
            preset = %self.preset,
            fps = self.fps,
            width,
            height,
            output = %self.output_path.display(),
            "ffmpeg encoder started"
        );

        self.running = Some(Running {
            child,
            stdin,
            width,
            height,
        });
        Ok(())
    }
}

impl FrameSink for FfmpegEncoder {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), EncoderError> {
        if self.running.is_none() {
            self.start(frame.width(), frame.height())?;
        }
        let Some(running) = self.running.as_mut() else {
            return Err(EncoderError::Spawn("encoder not running".into()));
        };

        if (frame.width(), frame.height()) != (running.width, running.height) {
            return Err(EncoderError::Write(format!(
                "frame {} is {}x{}, encoder expects {}x{}",
                frame.index(),
                frame.width(),
                frame.height(),
                running.width,
                running.height
            )));
        }

        running
            .stdin
            .write_all(frame.as_raw())
            .map_err(|e| EncoderError::Write(e.to_string()))?;
        self.frame_count += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), EncoderError> {
        let Some(Running { child, stdin, .. }) = self.running.take() else {
            warn!(output = %self.output_path.display(), "no frames written, skipping encode");
            return Ok(());
        };

        // Closing stdin tells ffmpeg there are no more frames.
        drop(stdin);

        let output = child
            .wait_with_output()
            .map_err(|e| EncoderError::Wait(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(stderr = %stderr, "ffmpeg exited with error");
            return Err(EncoderError::FfmpegFailed(stderr.into_owned()));
        }

        info!(
            frame_count = self.frame_count,
            output = %self.output_path.display(),
            "encoding complete"
        );
        Ok(())
    }

    fn output_path(&self) -> Option<&Path> {
        Some(&self.output_path)
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if let Some(mut running) = self.running.take() {
            let _ = running.child.kill();
            let _ = running.child.wait();
        }
    }
}

/// Check whether ffmpeg is available on PATH. Logs a warning if not found.
pub fn check_ffmpeg_available() -> bool {
    match Command::new("ffmpeg").arg("-version").output() {
        Ok(out) if out.status.success() => {
            debug!("ffmpeg is available");
            true
        }
        Ok(_) => {
            warn!("ffmpeg returned non-zero for -version; encoding may fail");
            false
        }
        Err(e) => {
            warn!(
                error = %e,
                "ffmpeg not found on PATH; video output will fail. \
                 Install ffmpeg with libx264/libx265 support."
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(codec: &str) -> CompressionConfig {
        CompressionConfig {
            codec: codec.into(),
            crf: 28,
            preset: "fast".into(),
        }
    }

    #[test]
    fn args_describe_raw_input_and_codec() {
        let encoder = FfmpegEncoder::new("/tmp/out.mp4", 29.97, &config("h265"));
        let args = encoder.args(320, 240);
        let joined = args.join(" ");
        assert!(joined.contains("-f rawvideo -pix_fmt rgb24 -s 320x240 -r 29.97 -i pipe:0"));
        assert!(joined.contains("-c:v libx265 -preset fast -crf 28"));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/out.mp4"));
    }

    #[test]
    fn unknown_codec_falls_back_to_h264() {
        let encoder = FfmpegEncoder::new("out.mp4", 30.0, &config("vp9"));
        assert!(encoder.args(2, 2).contains(&"libx264".to_string()));
    }

    #[test]
    fn finish_without_frames_does_not_spawn() {
        let mut encoder = FfmpegEncoder::new("never.mp4", 30.0, &config("h264"));
        encoder.finish().unwrap();
        assert_eq!(encoder.frame_count(), 0);
        assert_eq!(encoder.output_path(), Some(Path::new("never.mp4")));
    }
}
