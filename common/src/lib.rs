pub mod config;
pub mod detection;
pub mod frame;
pub mod source;

pub use detection::{BoundingBox, Detection};
pub use frame::Frame;
pub use source::{VideoInfo, VideoSource};
