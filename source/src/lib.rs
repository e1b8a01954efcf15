pub mod ffmpeg;
pub mod memory;
pub mod probe;
pub mod synthetic;

pub use ffmpeg::FfmpegSource;
pub use memory::MemorySource;
pub use probe::probe_video;
pub use synthetic::{Pattern, SyntheticSource};

use std::path::PathBuf;

/// Failures while opening a source. Once a source is open, read failures end
/// the stream instead of surfacing here.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("ffmpeg not found in PATH")]
    FfmpegNotFound,
    #[error("ffprobe not found in PATH")]
    FfprobeNotFound,
    #[error("ffprobe failed: {0}")]
    FfprobeFailed(String),
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),
    #[error("invalid video: {0}")]
    InvalidVideo(String),
    #[error("failed to spawn decoder: {0}")]
    Spawn(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse ffprobe output: {0}")]
    Json(#[from] serde_json::Error),
}
