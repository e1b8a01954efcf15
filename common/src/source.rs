use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::frame::Frame;

/// Container-level metadata reported by a video source.
///
/// `frame_count` is whatever the container claims; it can be an estimate and
/// a source may end before delivering that many frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub fps: f64,
    pub frame_count: u64,
    pub width: u32,
    pub height: u32,
}

/// An ordered, exhaustible sequence of decoded frames.
pub trait VideoSource {
    fn info(&self) -> VideoInfo;

    /// Next frame in decode order. `None` marks the end of the stream; a
    /// failed read also ends the stream and is not reported as an error.
    fn read_frame(&mut self) -> Option<Frame>;

    /// Backing file, when there is one. Used for size reporting only.
    fn path(&self) -> Option<&Path> {
        None
    }
}
