use framegate_common::config::Config;
use framegate_common::{Frame, VideoSource};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::control::{Progress, RunControl};
use crate::detector::{ObjectDetector, DEFAULT_CONFIDENCE};
use crate::error::PipelineError;
use crate::gate::MotionGate;
use crate::sink::FrameSink;

/// Why a frame survived compression. When a frame is both a keyframe and a
/// detection hit it is tagged `Detection`; the flags on [`KeptFrame`] keep
/// both facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepReason {
    Keyframe,
    Detection,
}

#[derive(Debug, Clone)]
pub struct KeptFrame {
    pub frame: Frame,
    pub original_index: u64,
    pub reason: KeepReason,
    pub keyframe_due: bool,
    pub detection_hit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDescriptor {
    pub path: Option<PathBuf>,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub kept_frames: Vec<KeptFrame>,
    /// Decoder-reported count; the ratio is taken against this.
    pub original_frame_count: u64,
    pub frames_processed: u64,
    pub kept_count: u64,
    pub fps: f64,
    pub output: OutputDescriptor,
    pub original_size_bytes: u64,
    pub compressed_size_bytes: u64,
    pub detector_invocations: u64,
    pub total_time: Duration,
    pub cancelled: bool,
}

impl CompressionResult {
    pub fn compression_ratio(&self) -> f64 {
        if self.original_frame_count == 0 {
            return 0.0;
        }
        self.kept_count as f64 / self.original_frame_count as f64
    }

    pub fn compression_percent(&self) -> f64 {
        (1.0 - self.compression_ratio()) * 100.0
    }

    pub fn count_by_reason(&self, reason: KeepReason) -> u64 {
        self.kept_frames.iter().filter(|k| k.reason == reason).count() as u64
    }

    pub fn summary(&self) -> CompressionSummary {
        CompressionSummary {
            original_frame_count: self.original_frame_count,
            frames_processed: self.frames_processed,
            kept_count: self.kept_count,
            keyframes: self.count_by_reason(KeepReason::Keyframe),
            detections: self.count_by_reason(KeepReason::Detection),
            compression_ratio: self.compression_ratio(),
            compression_percent: self.compression_percent(),
            output: self.output.clone(),
            original_size_bytes: self.original_size_bytes,
            compressed_size_bytes: self.compressed_size_bytes,
            detector_invocations: self.detector_invocations,
            total_time_secs: self.total_time.as_secs_f64(),
            cancelled: self.cancelled,
        }
    }
}

/// Frame-free projection of a [`CompressionResult`] for reports.
#[derive(Debug, Clone, Serialize)]
pub struct CompressionSummary {
    pub original_frame_count: u64,
    pub frames_processed: u64,
    pub kept_count: u64,
    pub keyframes: u64,
    pub detections: u64,
    pub compression_ratio: f64,
    pub compression_percent: f64,
    pub output: OutputDescriptor,
    pub original_size_bytes: u64,
    pub compressed_size_bytes: u64,
    pub detector_invocations: u64,
    pub total_time_secs: f64,
    pub cancelled: bool,
}

/// Frames between mandatory keyframes: one per second of source time.
pub fn keyframe_interval(fps: f64) -> i64 {
    (fps.round() as i64).max(1)
}

/// Reduces a video to keyframes plus frames where the detector confirmed
/// something moving.
///
/// A frame is kept when a keyframe is due (at least `keyframe_interval`
/// frames since the last one) or when the gate reports motion and the
/// detector returns at least one detection. Kept frames go to the sink in
/// source order and are re-timed at the source fps, so gaps between them
/// are not preserved.
pub struct SmartCompressor {
    gate: MotionGate,
    confidence: f32,
    max_frames: Option<u64>,
}

impl SmartCompressor {
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

    pub fn run(
        &mut self,
        source: &mut dyn VideoSource,
        detector: &mut dyn ObjectDetector,
        sink: &mut dyn FrameSink,
        control: &mut RunControl<'_>,
    ) -> Result<CompressionResult, PipelineError> {
        let info = source.info();
        let interval = keyframe_interval(info.fps);
        self.gate.reset();
        info!(
            detector = detector.name(),
            total_frames = info.frame_count,
            fps = info.fps,
            keyframe_interval = interval,
            "compression pass started"
        );

        let started = Instant::now();
        let mut kept_frames = Vec::new();
        let mut last_keyframe = -interval;
        let mut index: i64 = 0;
        let mut detector_invocations = 0u64;
        let mut cancelled = false;

        loop {
            if control.is_cancelled() {
                info!(processed = index, "compression pass cancelled");
                cancelled = true;
                break;
            }
            if self.max_frames.is_some_and(|max| index as u64 >= max) {
                break;
            }
            let Some(frame) = source.read_frame() else {
                break;
            };

            let mut reason = None;
            let keyframe_due = index - last_keyframe >= interval;
            if keyframe_due {
                reason = Some(KeepReason::Keyframe);
                last_keyframe = index;
            }

            let reading = self.gate.detect(&frame)?;
            let mut detection_hit = false;
            if reading.motion {
                detector_invocations += 1;
                let detections = detector.detect(&frame, self.confidence)?;
                if !detections.is_empty() {
                    detection_hit = true;
                    reason = Some(KeepReason::Detection);
                }
            }

            if let Some(reason) = reason {
                debug!(frame = index, ?reason, keyframe_due, detection_hit, "keeping frame");
                sink.write_frame(&frame)?;
                kept_frames.push(KeptFrame {
                    frame,
                    original_index: index as u64,
                    reason,
                    keyframe_due,
                    detection_hit,
                });
            }

            index += 1;
            control.report(Progress {
                processed: index as u64,
                total: info.frame_count,
            });
        }

        sink.finish()?;

        let output_path = sink.output_path().map(Path::to_path_buf);
        let result = CompressionResult {
            kept_count: kept_frames.len() as u64,
            kept_frames,
            original_frame_count: info.frame_count,
            frames_processed: index as u64,
            fps: info.fps,
            original_size_bytes: source.path().map(file_size).unwrap_or(0),
            compressed_size_bytes: output_path.as_deref().map(file_size).unwrap_or(0),
            output: OutputDescriptor {
                path: output_path,
                fps: info.fps,
                width: info.width,
                height: info.height,
            },
            detector_invocations,
            total_time: started.elapsed(),
            cancelled,
        };
        info!(
            frames_processed = result.frames_processed,
            kept = result.kept_count,
            ratio = result.compression_ratio(),
            detector_invocations,
            elapsed_ms = result.total_time.as_millis() as u64,
            "compression pass finished"
        );
        Ok(result)
    }
}

/// Size of the file at `path`, or 0 when it cannot be stat'ed.
fn file_size(path: &Path) -> u64 {
    match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "could not stat file, reporting size 0");
            0
        }
    }
}
