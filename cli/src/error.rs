use framegate_pipeline::{DetectorError, EncoderError, PipelineError};
use framegate_source::SourceError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to open video: {0}")]
    Source(#[from] SourceError),
    #[error("failed to set up detector: {0}")]
    Detector(#[from] DetectorError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("failed to write annotated video: {0}")]
    Encoder(#[from] EncoderError),
    #[error("failed to write report {path}: {message}")]
    Report { path: String, message: String },
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
