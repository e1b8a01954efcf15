pub mod annotate;
pub mod baseline;
pub mod compressor;
pub mod control;
pub mod detector;
pub mod encoder;
pub mod error;
pub mod gate;
mod imaging;
pub mod result;
pub mod sink;
pub mod speedup;
pub mod two_stage;

pub use baseline::BaselinePipeline;
pub use compressor::{
    keyframe_interval, CompressionResult, CompressionSummary, KeepReason, KeptFrame,
    OutputDescriptor, SmartCompressor,
};
pub use control::{CancelSignal, Progress, RunControl};
pub use detector::{DetectorError, HttpDetector, MockDetector, ObjectDetector};
pub use encoder::{check_ffmpeg_available, EncoderError, FfmpegEncoder};
pub use error::PipelineError;
pub use gate::{MotionGate, MotionReading};
pub use result::{FrameEntry, PassKind, ProcessingResult, ProcessingSummary};
pub use sink::FrameSink;
pub use speedup::{compare, SpeedupMetrics};
pub use two_stage::TwoStagePipeline;
