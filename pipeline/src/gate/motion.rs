use framegate_common::config::MotionConfig;
use framegate_common::Frame;
use image::GrayImage;
use opencv::core::{self, Mat, Size};
use opencv::imgproc;
use serde::Serialize;
use tracing::{debug, warn};

use crate::imaging::gray_to_mat;

/// Frame area the default pixel threshold is tuned for (640x480).
pub const REFERENCE_PIXELS: u64 = 640 * 480;

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MotionReading {
    pub motion: bool,
    /// Pixels whose blurred luminance changed by more than the diff
    /// threshold. Never exceeds the frame's pixel count.
    pub diff_pixel_count: u64,
}

impl MotionReading {
    /// Returned when there is no baseline to compare against.
    pub const COLD: Self = Self {
        motion: false,
        diff_pixel_count: 0,
    };
}

/// Cheap frame-difference motion estimator that decides whether the
/// expensive detector should run.
///
/// Algorithm:
/// 1. Convert the frame to luminance.
/// 2. Gaussian-blur both the current luminance and the stored previous one
///    (square kernel, sigma derived from the kernel size, reflect-101 borders).
/// 3. Absolute difference, binarized at `diff_threshold`.
/// 4. Motion iff the count of changed pixels exceeds the pixel threshold.
///
/// The stored baseline is the *unblurred* luminance of the last frame seen,
/// replaced on every call whatever the outcome, so each comparison re-blurs
/// it from scratch.
///
/// One gate tracks one video. Call [`MotionGate::reset`] before reusing it on
/// another pass; the first call after construction or reset always reports
/// no motion.
pub struct MotionGate {
    config: MotionConfig,
    kernel: Size,
    previous: Option<GrayImage>,
}

impl MotionGate {
    /// An even kernel size is bumped to the next odd one.
    pub fn new(config: MotionConfig) -> Self {
        let side = (config.blur_kernel.max(1) | 1) as i32;
        Self {
            kernel: Size::new(side, side),
            config,
            previous: None,
        }
    }

    pub fn with_threshold(pixel_threshold: u64) -> Self {
        Self::new(MotionConfig {
            pixel_threshold,
            ..MotionConfig::default()
        })
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn has_baseline(&self) -> bool {
        self.previous.is_some()
    }

    /// Pixel threshold in effect for a frame of the given size.
    pub fn effective_threshold(&self, width: u32, height: u32) -> u64 {
        if !self.config.scale_to_resolution {
            return self.config.pixel_threshold;
        }
        let pixels = width as u64 * height as u64;
        ((self.config.pixel_threshold as u128 * pixels as u128 / REFERENCE_PIXELS as u128) as u64)
            .max(1)
    }

    pub fn kernel_size(&self) -> u32 {
        self.kernel.width as u32
    }

    pub fn detect(&mut self, frame: &Frame) -> opencv::Result<MotionReading> {
        let current = frame.luma();

        let Some(previous) = self.previous.take() else {
            debug!(frame = frame.index(), "motion gate cold start, storing baseline");
            self.previous = Some(current);
            return Ok(MotionReading::COLD);
        };

        if previous.dimensions() != current.dimensions() {
            warn!(
                frame = frame.index(),
                previous = ?previous.dimensions(),
                current = ?current.dimensions(),
                "frame size changed, re-baselining motion gate"
            );
            self.previous = Some(current);
            return Ok(MotionReading::COLD);
        }

        let diff_pixel_count = if frame.pixel_count() == 0 {
            0
        } else {
            self.changed_pixels(&current, &previous)?
        };

        let threshold = self.effective_threshold(frame.width(), frame.height());
        let motion = diff_pixel_count > threshold;
        debug!(
            frame = frame.index(),
            diff_pixel_count,
            threshold,
            motion,
            "motion gate comparison"
        );

        self.previous = Some(current);
        Ok(MotionReading {
            motion,
            diff_pixel_count,
        })
    }

    /// Blur both sides, diff them and count pixels above the diff threshold.
    fn changed_pixels(&self, current: &GrayImage, previous: &GrayImage) -> opencv::Result<u64> {
        let mut current_blur = Mat::default();
        imgproc::gaussian_blur_def(&gray_to_mat(current)?, &mut current_blur, self.kernel, 0.0)?;
        let mut previous_blur = Mat::default();
        imgproc::gaussian_blur_def(&gray_to_mat(previous)?, &mut previous_blur, self.kernel, 0.0)?;

        let mut diff = Mat::default();
        core::absdiff(&current_blur, &previous_blur, &mut diff)?;
        let mut binary = Mat::default();
        imgproc::threshold(
            &diff,
            &mut binary,
            self.config.diff_threshold as f64,
            255.0,
            imgproc::THRESH_BINARY,
        )?;
        Ok(core::count_non_zero(&binary)? as u64)
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

impl Default for MotionGate {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}
