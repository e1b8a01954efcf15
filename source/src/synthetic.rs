use framegate_common::{Frame, VideoInfo, VideoSource};
use image::{Rgb, RgbImage};

/// Generated frame content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Every frame is the same solid colour.
    Static([u8; 3]),
    /// Alternates black and white on every frame.
    Flicker,
    /// Background toggles black/white once per second of 30 fps footage; a
    /// green block slides right during the first 30 frames of every 60.
    /// Geometry is laid out for 640x480 and scaled to the requested size.
    MovingBlock,
}

/// Deterministic, decoder-free video source for tests and dry runs.
pub struct SyntheticSource {
    pattern: Pattern,
    info: VideoInfo,
    next: u64,
}

impl SyntheticSource {
    pub fn new(pattern: Pattern, width: u32, height: u32, fps: f64, frame_count: u64) -> Self {
        Self {
            pattern,
            info: VideoInfo {
                fps,
                frame_count,
                width,
                height,
            },
            next: 0,
        }
    }

    /// Render frame `n` without advancing the stream.
    pub fn frame_at(&self, n: u64) -> Frame {
        let VideoInfo { width, height, .. } = self.info;
        let image = match self.pattern {
            Pattern::Static(rgb) => RgbImage::from_pixel(width, height, Rgb(rgb)),
            Pattern::Flicker => {
                let v = if n % 2 == 0 { 0 } else { 255 };
                RgbImage::from_pixel(width, height, Rgb([v, v, v]))
            }
            Pattern::MovingBlock => moving_block(n, width, height),
        };
        Frame::new(n, image)
    }
}

fn moving_block(n: u64, width: u32, height: u32) -> RgbImage {
    let v = if (n / 30) % 2 == 0 { 0 } else { 255 };
    let mut img = RgbImage::from_pixel(width, height, Rgb([v, v, v]));

    if n % 60 < 30 {
        let scale_x = |x: u64| (x * width as u64 / 640) as u32;
        let scale_y = |y: u64| (y * height as u64 / 480) as u32;
        let x0 = scale_x(n % 300 + 100);
        let x1 = scale_x(n % 300 + 200).min(width);
        let y0 = scale_y(100);
        let y1 = scale_y(200).min(height);
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, Rgb([0, 255, 0]));
            }
        }
    }
    img
}

impl VideoSource for SyntheticSource {
    fn info(&self) -> VideoInfo {
        self.info
    }

    fn read_frame(&mut self) -> Option<Frame> {
        if self.next >= self.info.frame_count {
            return None;
        }
        let frame = self.frame_at(self.next);
        self.next += 1;
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_frames_are_identical() {
        let source = SyntheticSource::new(Pattern::Static([40, 80, 120]), 8, 6, 30.0, 10);
        assert_eq!(source.frame_at(0).as_raw(), source.frame_at(9).as_raw());
    }

    #[test]
    fn flicker_alternates() {
        let source = SyntheticSource::new(Pattern::Flicker, 4, 4, 30.0, 4);
        assert!(source.frame_at(0).as_raw().iter().all(|&b| b == 0));
        assert!(source.frame_at(1).as_raw().iter().all(|&b| b == 255));
    }

    #[test]
    fn moving_block_is_drawn_in_first_half_of_cycle() {
        let source = SyntheticSource::new(Pattern::MovingBlock, 640, 480, 30.0, 120);
        let with_block = source.frame_at(5);
        assert_eq!(with_block.image().get_pixel(150, 150).0, [0, 255, 0]);
        let without_block = source.frame_at(45);
        assert_ne!(without_block.image().get_pixel(150, 150).0, [0, 255, 0]);
    }

    #[test]
    fn stream_ends_at_frame_count() {
        let mut source = SyntheticSource::new(Pattern::Flicker, 2, 2, 10.0, 3);
        let mut n = 0;
        while let Some(frame) = source.read_frame() {
            assert_eq!(frame.index(), n);
            n += 1;
        }
        assert_eq!(n, 3);
    }
}
