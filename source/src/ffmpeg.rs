use framegate_common::{Frame, VideoInfo, VideoSource};
use std::ffi::OsString;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use tracing::{debug, info, warn};

use crate::probe::probe_video;
use crate::SourceError;

/// Decodes a video file through an ffmpeg subprocess that writes packed
/// rgb24 frames to its stdout.
///
/// Metadata comes from ffprobe before the decoder starts. The stream ends at
/// the first short or failed read; the child is killed on drop.
pub struct FfmpegSource {
    path: PathBuf,
    info: VideoInfo,
    child: Child,
    stdout: ChildStdout,
    frame_len: usize,
    next_index: u64,
    finished: bool,
}

impl FfmpegSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let info = probe_video(path)?;
        if info.width == 0 || info.height == 0 {
            return Err(SourceError::InvalidVideo(format!(
                "video stream reports {}x{}",
                info.width, info.height
            )));
        }

        let mut child = Command::new("ffmpeg")
            .args(decode_args(path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => SourceError::FfmpegNotFound,
                _ => SourceError::Spawn(e.to_string()),
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SourceError::Spawn("could not get stdout handle".into()))?;

        info!(
            path = path.display().to_string(),
            fps = info.fps,
            frame_count = info.frame_count,
            width = info.width,
            height = info.height,
            "ffmpeg decoder started"
        );

        Ok(Self {
            path: path.to_path_buf(),
            info,
            child,
            stdout,
            frame_len: info.width as usize * info.height as usize * 3,
            next_index: 0,
            finished: false,
        })
    }
}

fn decode_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-v", "error", "-nostdin", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(path.as_os_str().to_os_string());
    args.extend(
        ["-an", "-sn", "-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"]
            .into_iter()
            .map(OsString::from),
    );
    args
}

impl VideoSource for FfmpegSource {
    fn info(&self) -> VideoInfo {
        self.info
    }

    fn read_frame(&mut self) -> Option<Frame> {
        if self.finished {
            return None;
        }

        let mut buf = vec![0u8; self.frame_len];
        match self.stdout.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                debug!(frames = self.next_index, "decoder reached end of stream");
                self.finished = true;
                return None;
            }
            Err(e) => {
                warn!(error = %e, frames = self.next_index, "decoder read failed, ending stream");
                self.finished = true;
                return None;
            }
        }

        let frame = Frame::from_rgb24(self.next_index, self.info.width, self.info.height, buf)?;
        self.next_index += 1;
        Some(frame)
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        // The decoder may still be running if the caller stopped early.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
