use crate::detector::DetectorError;
use crate::encoder::EncoderError;

/// Fatal failure of a pipeline pass. End of stream, unreadable file sizes and
/// cancellation are not errors and never show up here.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("detector failed: {0}")]
    Detector(#[from] DetectorError),
    #[error("output encoding failed: {0}")]
    Encoder(#[from] EncoderError),
    #[error("image processing failed: {0}")]
    Imaging(#[from] opencv::Error),
}
