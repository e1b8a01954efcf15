use framegate_common::config::Config;
use framegate_common::VideoSource;
use std::time::Instant;
use tracing::{debug, info};

use crate::annotate::annotate;
use crate::control::{Progress, RunControl};
use crate::detector::{ObjectDetector, DEFAULT_CONFIDENCE};
use crate::error::PipelineError;
use crate::gate::MotionGate;
use crate::result::{FrameEntry, PassKind, ProcessingResult};

/// Motion gate in front of the detector: the detector only sees frames the
/// gate flags as moving.
pub struct TwoStagePipeline {
    gate: MotionGate,
    confidence: f32,
    max_frames: Option<u64>,
}

impl TwoStagePipeline {
    pub fn new(gate: MotionGate) -> Self {
        Self {
            gate,
            confidence: DEFAULT_CONFIDENCE,
            max_frames: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(MotionGate::new(config.motion.clone()))
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

    /// Run one pass over `source`. The gate is reset first, so the first
    /// frame is always a cold start. A detector error aborts the pass.
    pub fn run(
        &mut self,
        source: &mut dyn VideoSource,
        detector: &mut dyn ObjectDetector,
        control: &mut RunControl<'_>,
    ) -> Result<ProcessingResult, PipelineError> {
        let info = source.info();
        self.gate.reset();
        info!(
            detector = detector.name(),
            total_frames = info.frame_count,
            fps = info.fps,
            width = info.width,
            height = info.height,
            "two-stage pass started"
        );

        let started = Instant::now();
        let mut entries: Vec<FrameEntry> = Vec::new();
        let mut frames_with_motion = 0u64;
        let mut detector_invocations = 0u64;
        let mut cancelled = false;

        loop {
            if control.is_cancelled() {
                info!(processed = entries.len(), "two-stage pass cancelled");
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
            let reading = self.gate.detect(&frame)?;
            let detections = if reading.motion {
                frames_with_motion += 1;
                detector_invocations += 1;
                detector.detect(&frame, self.confidence)?
            } else {
                Vec::new()
            };

            let annotated_frame = annotate(&frame, &detections, Some(reading.motion))?;
            debug!(
                frame = frame.index(),
                motion = reading.motion,
                diff_pixel_count = reading.diff_pixel_count,
                detections = detections.len(),
                "frame processed"
            );
            entries.push(FrameEntry {
                index: frame.index(),
                annotated_frame: Some(annotated_frame),
                motion_detected: reading.motion,
                diff_pixel_count: reading.diff_pixel_count,
                detections,
                elapsed: frame_started.elapsed(),
            });

            control.report(Progress {
                processed: entries.len() as u64,
                total: info.frame_count,
            });
        }

        let result = ProcessingResult {
            kind: PassKind::TwoStage,
            total_time: started.elapsed(),
            total_frames: info.frame_count,
            frames_processed: entries.len() as u64,
            frames_with_motion: Some(frames_with_motion),
            detector_invocations,
            fps: info.fps,
            cancelled,
            entries,
        };
        info!(
            frames_processed = result.frames_processed,
            frames_with_motion,
            detector_invocations,
            elapsed_ms = result.total_time.as_millis() as u64,
            "two-stage pass finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::CancelSignal;
    use crate::detector::{DetectorError, MockDetector};
    use framegate_common::Frame;
    use framegate_source::{MemorySource, Pattern, SyntheticSource};

    #[test]
    fn static_source_never_reaches_detector() {
        let mut source = SyntheticSource::new(Pattern::Static([90, 90, 90]), 64, 48, 30.0, 50);
        let mut detector = MockDetector::always();
        let mut pipeline = TwoStagePipeline::new(MotionGate::default());

        let result = pipeline
            .run(&mut source, &mut detector, &mut RunControl::new())
            .unwrap();

        assert_eq!(result.frames_processed, 50);
        assert_eq!(result.frames_with_motion, Some(0));
        assert_eq!(result.detector_invocations, 0);
        assert_eq!(detector.invocations(), 0);
        assert!(result.entries.iter().all(|e| e.detections.is_empty()));
        assert!(!result.cancelled);
    }

    #[test]
    fn every_moving_frame_is_detected() {
        let mut source = SyntheticSource::new(Pattern::Flicker, 32, 24, 30.0, 12);
        let mut detector = MockDetector::always();
        let mut pipeline = TwoStagePipeline::new(MotionGate::with_threshold(100));

        let result = pipeline
            .run(&mut source, &mut detector, &mut RunControl::new())
            .unwrap();

        // Frame 0 is the cold start; every later frame flips black/white.
        assert_eq!(result.frames_processed, 12);
        assert_eq!(result.frames_with_motion, Some(11));
        assert_eq!(result.detector_invocations, 11);
        assert_eq!(detector.calls(), (1..12u64).collect::<Vec<_>>().as_slice());
        assert!(!result.entries[0].motion_detected);
        assert!(result.entries[1..].iter().all(|e| e.detections.len() == 1));
    }

    #[test]
    fn invocations_match_motion_frames() {
        let mut source = SyntheticSource::new(Pattern::MovingBlock, 160, 120, 30.0, 90);
        let mut detector = MockDetector::with_pattern(|n| n % 3 == 0);
        let mut pipeline = TwoStagePipeline::new(MotionGate::with_threshold(50));

        let result = pipeline
            .run(&mut source, &mut detector, &mut RunControl::new())
            .unwrap();

        let moving = result.entries.iter().filter(|e| e.motion_detected).count() as u64;
        assert_eq!(result.frames_with_motion, Some(moving));
        assert_eq!(result.detector_invocations, moving);
        assert!(result.detector_invocations <= result.frames_processed);
        assert!(moving > 0);
        let pixels = 160 * 120;
        assert!(result.entries.iter().all(|e| e.diff_pixel_count <= pixels));
    }

    #[test]
    fn short_stream_ends_normally() {
        let frames = (0..4).map(|i| Frame::solid(i, 8, 8, [0, 0, 0])).collect();
        let mut source = MemorySource::new(25.0, frames).with_reported_count(100);
        let mut pipeline = TwoStagePipeline::new(MotionGate::default());

        let result = pipeline
            .run(&mut source, &mut MockDetector::empty(), &mut RunControl::new())
            .unwrap();

        assert_eq!(result.frames_processed, 4);
        assert_eq!(result.total_frames, 100);
        assert_eq!(result.fps, 25.0);
        assert!(!result.cancelled);
    }

    #[test]
    fn progress_fires_per_frame() {
        let mut source = SyntheticSource::new(Pattern::Static([0, 0, 0]), 8, 8, 30.0, 5);
        let mut pipeline = TwoStagePipeline::new(MotionGate::default());
        let mut seen = Vec::new();

        {
            let mut control = RunControl::new().with_progress(|p| seen.push((p.processed, p.total)));
            pipeline
                .run(&mut source, &mut MockDetector::empty(), &mut control)
                .unwrap();
        }

        assert_eq!(seen, vec![(1, 5), (2, 5), (3, 5), (4, 5), (5, 5)]);
    }

    #[test]
    fn cancellation_returns_partial_result() {
        let mut source = SyntheticSource::new(Pattern::Static([0, 0, 0]), 8, 8, 30.0, 100);
        let mut pipeline = TwoStagePipeline::new(MotionGate::default());
        let signal = CancelSignal::new();
        let trigger = signal.clone();

        let mut control = RunControl::new()
            .with_cancel(signal)
            .with_progress(move |p| {
                if p.processed == 10 {
                    trigger.cancel();
                }
            });
        let result = pipeline
            .run(&mut source, &mut MockDetector::empty(), &mut control)
            .unwrap();

        assert!(result.cancelled);
        assert_eq!(result.frames_processed, 10);
        assert_eq!(result.entries.len(), 10);
    }

    #[test]
    fn max_frames_caps_the_pass() {
        let mut source = SyntheticSource::new(Pattern::Static([0, 0, 0]), 8, 8, 30.0, 100);
        let mut pipeline = TwoStagePipeline::new(MotionGate::default()).with_max_frames(Some(7));

        let result = pipeline
            .run(&mut source, &mut MockDetector::empty(), &mut RunControl::new())
            .unwrap();

        assert_eq!(result.frames_processed, 7);
        assert!(!result.cancelled);
    }

    #[test]
    fn detector_failure_aborts_the_pass() {
        let mut source = SyntheticSource::new(Pattern::Flicker, 32, 24, 30.0, 10);
        let mut detector = MockDetector::always().failing_at(3);
        let mut pipeline = TwoStagePipeline::new(MotionGate::with_threshold(100));

        let err = pipeline
            .run(&mut source, &mut detector, &mut RunControl::new())
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Detector(DetectorError::Failed { frame: 3, .. })
        ));
        assert_eq!(detector.calls(), &[1, 2, 3]);
    }

    #[test]
    fn gate_is_reset_between_runs() {
        let mut pipeline = TwoStagePipeline::new(MotionGate::with_threshold(100));

        let mut white = SyntheticSource::new(Pattern::Static([255, 255, 255]), 32, 24, 30.0, 3);
        pipeline
            .run(&mut white, &mut MockDetector::empty(), &mut RunControl::new())
            .unwrap();

        // A black video right after a white one must still open cold.
        let mut black = SyntheticSource::new(Pattern::Static([0, 0, 0]), 32, 24, 30.0, 3);
        let result = pipeline
            .run(&mut black, &mut MockDetector::empty(), &mut RunControl::new())
            .unwrap();

        assert_eq!(result.frames_with_motion, Some(0));
        assert_eq!(result.entries[0].diff_pixel_count, 0);
    }
}
