use framegate_common::config::Config;
use framegate_common::VideoSource;
use std::time::Instant;
use tracing::{debug, info};

use crate::annotate::annotate;
use crate::control::{Progress, RunControl};
use crate::detector::{ObjectDetector, DEFAULT_CONFIDENCE};
use crate::error::PipelineError;
use crate::result::{FrameEntry, PassKind, ProcessingResult};

/// Reference pass: the detector runs on every frame, no gate.
pub struct BaselinePipeline {
    confidence: f32,
    max_frames: Option<u64>,
    annotate: bool,
}

impl Default for BaselinePipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl BaselinePipeline {
    pub fn new() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            max_frames: None,
            annotate: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .with_confidence(config.detector.confidence)
            .with_max_frames(config.processing.max_frames)
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_max_frames(mut self, max_frames: Option<u64>) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// With annotation off no overlay is drawn and entries carry no frame,
    /// for callers that only want timings and detections.
    pub fn with_annotation(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    pub fn run(
        &mut self,
        source: &mut dyn VideoSource,
        detector: &mut dyn ObjectDetector,
        control: &mut RunControl<'_>,
    ) -> Result<ProcessingResult, PipelineError> {
        let info = source.info();
        info!(
            detector = detector.name(),
            total_frames = info.frame_count,
            fps = info.fps,
            "baseline pass started"
        );

        let started = Instant::now();
        let mut entries: Vec<FrameEntry> = Vec::new();
        let mut detector_invocations = 0u64;
        let mut cancelled = false;

        loop {
            if control.is_cancelled() {
                info!(processed = entries.len(), "baseline pass cancelled");
                cancelled = true;
                break;
            }
            if self.max_frames.is_some_and(|max| entries.len() as u64 >= max) {
                break;
            }
            let Some(frame) = source.read_frame() else {
                break;
            };

            let frame_started = Instant::now();
            detector_invocations += 1;
            let detections = detector.detect(&frame, self.confidence)?;
            let annotated_frame = if self.annotate {
                Some(annotate(&frame, &detections, None)?)
            } else {
                None
            };
            debug!(
                frame = frame.index(),
                detections = detections.len(),
                "frame processed"
            );

            entries.push(FrameEntry {
                index: frame.index(),
                annotated_frame,
                motion_detected: false,
                diff_pixel_count: 0,
                detections,
                elapsed: frame_started.elapsed(),
            });

            control.report(Progress {
                processed: entries.len() as u64,
                total: info.frame_count,
            });
        }

        let result = ProcessingResult {
            kind: PassKind::Baseline,
            total_time: started.elapsed(),
            total_frames: info.frame_count,
            frames_processed: entries.len() as u64,
            frames_with_motion: None,
            detector_invocations,
            fps: info.fps,
            cancelled,
            entries,
        };
        info!(
            frames_processed = result.frames_processed,
            detector_invocations,
            elapsed_ms = result.total_time.as_millis() as u64,
            "baseline pass finished"
        );
        Ok(result)
    }
}
