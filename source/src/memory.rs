use framegate_common::{Frame, VideoInfo, VideoSource};
use std::collections::VecDeque;

/// Serves frames from memory in the order given.
pub struct MemorySource {
    frames: VecDeque<Frame>,
    info: VideoInfo,
}

impl MemorySource {
    /// Dimensions come from the first frame; the reported frame count is the
    /// number of frames supplied.
    pub fn new(fps: f64, frames: Vec<Frame>) -> Self {
        let (width, height) = frames
            .first()
            .map(|f| (f.width(), f.height()))
            .unwrap_or((0, 0));
        Self {
            info: VideoInfo {
                fps,
                frame_count: frames.len() as u64,
                width,
                height,
            },
            frames: frames.into(),
        }
    }

    /// Override the reported frame count, e.g. to mimic a container whose
    /// header promises more frames than it holds.
    pub fn with_reported_count(mut self, frame_count: u64) -> Self {
        self.info.frame_count = frame_count;
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl VideoSource for MemorySource {
    fn info(&self) -> VideoInfo {
        self.info
    }

    fn read_frame(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_frames_in_order_then_ends() {
        let frames = (0..3).map(|i| Frame::solid(i, 4, 2, [0, 0, 0])).collect();
        let mut source = MemorySource::new(25.0, frames);
        let info = source.info();
        assert_eq!(info.frame_count, 3);
        assert_eq!((info.width, info.height), (4, 2));

        let indices: Vec<u64> = std::iter::from_fn(|| source.read_frame())
            .map(|f| f.index())
            .collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(source.read_frame().is_none());
    }

    #[test]
    fn reported_count_can_exceed_contents() {
        let source = MemorySource::new(30.0, vec![Frame::solid(0, 2, 2, [1, 1, 1])])
            .with_reported_count(10);
        assert_eq!(source.info().frame_count, 10);
        assert_eq!(source.remaining(), 1);
    }
}
