use image::{GrayImage, Luma, Rgb, RgbImage};
use std::sync::Arc;

/// A decoded video frame: an RGB raster plus its zero-based position in the
/// source sequence.
///
/// Pixel storage is reference-counted, so cloning a `Frame` is cheap and the
/// raster itself is never mutated after construction. Annotation draws on a
/// copy and wraps the result in a new `Frame`.
#[derive(Debug, Clone)]
pub struct Frame {
    index: u64,
    image: Arc<RgbImage>,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self {
            index,
            image: Arc::new(image),
        }
    }

    /// Build a frame from packed rgb24 bytes. Returns `None` when the buffer
    /// length does not match `width * height * 3`.
    pub fn from_rgb24(index: u64, width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        RgbImage::from_raw(width, height, data).map(|img| Self::new(index, img))
    }

    /// A frame filled with a single colour.
    pub fn solid(index: u64, width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self::new(index, RgbImage::from_pixel(width, height, Rgb(rgb)))
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Packed rgb24 bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Same raster, different sequence position.
    pub fn with_index(&self, index: u64) -> Self {
        Self {
            index,
            image: Arc::clone(&self.image),
        }
    }

    /// Single-channel luminance using BT.601 weights, rounded to nearest.
    pub fn luma(&self) -> GrayImage {
        let mut gray = GrayImage::new(self.width(), self.height());
        for (dst, src) in gray.pixels_mut().zip(self.image.pixels()) {
            let [r, g, b] = src.0;
            let y = (r as u32 * 299 + g as u32 * 587 + b as u32 * 114 + 500) / 1000;
            *dst = Luma([y as u8]);
        }
        gray
    }
}
