use framegate_common::Frame;
use std::path::Path;

use crate::encoder::EncoderError;

/// Destination for frames a pass decides to keep.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), EncoderError>;

    /// Flush and close. Called once, after the last frame.
    fn finish(&mut self) -> Result<(), EncoderError>;

    /// File written by this sink, if any.
    fn output_path(&self) -> Option<&Path> {
        None
    }
}

/// Collects frames in memory.
impl FrameSink for Vec<Frame> {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), EncoderError> {
        self.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), EncoderError> {
        Ok(())
    }
}
