pub mod http;
pub mod mock;

pub use http::HttpDetector;
pub use mock::MockDetector;

use framegate_common::{Detection, Frame};

/// Confidence threshold used when the caller has no preference.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// The expensive stage: an object detector the pipelines call only when
/// they decide a frame is worth it.
///
/// From the pipeline's point of view every call is independent. Any model
/// state lives inside the implementation. Errors are fatal for the pass that
/// made the call and are never retried.
pub trait ObjectDetector {
    /// Returns detections at or above `confidence`, in detector order.
    fn detect(&mut self, frame: &Frame, confidence: f32) -> Result<Vec<Detection>, DetectorError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error("detector request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("detector returned HTTP status {0}")]
    Status(u16),
    #[error("failed to decode detector response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("failed to encode frame for detector: {0}")]
    Encode(#[from] image::ImageError),
    #[error("{detector} failed on frame {frame}: {message}")]
    Failed {
        detector: String,
        frame: u64,
        message: String,
    },
}
