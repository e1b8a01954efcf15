use framegate_common::{Detection, Frame};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    TwoStage,
    Baseline,
}

impl PassKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassKind::TwoStage => "two_stage",
            PassKind::Baseline => "baseline",
        }
    }
}

/// What happened to one frame during a pass.
#[derive(Debug, Clone)]
pub struct FrameEntry {
    pub index: u64,
    /// `None` when the pass ran with annotation turned off.
    pub annotated_frame: Option<Frame>,
    /// Always false for the baseline pass, which has no gate.
    pub motion_detected: bool,
    pub diff_pixel_count: u64,
    pub detections: Vec<Detection>,
    /// Gate, detector and annotation time for this frame. Decode is excluded.
    pub elapsed: Duration,
}

/// Output of a two-stage or baseline pass.
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub kind: PassKind,
    pub entries: Vec<FrameEntry>,
    /// Wall clock for the whole pass, decode included.
    pub total_time: Duration,
    /// Decoder-reported count; may disagree with `frames_processed`.
    pub total_frames: u64,
    pub frames_processed: u64,
    /// `None` for the baseline pass.
    pub frames_with_motion: Option<u64>,
    pub detector_invocations: u64,
    pub fps: f64,
    pub cancelled: bool,
}

impl ProcessingResult {
    pub fn annotated_frames(&self) -> impl Iterator<Item = &Frame> {
        self.entries.iter().filter_map(|e| e.annotated_frame.as_ref())
    }

    pub fn total_detections(&self) -> u64 {
        self.entries.iter().map(|e| e.detections.len() as u64).sum()
    }

    pub fn summary(&self) -> ProcessingSummary {
        let avg_frame_ms = if self.frames_processed == 0 {
            0.0
        } else {
            self.total_time.as_secs_f64() * 1000.0 / self.frames_processed as f64
        };
        ProcessingSummary {
            kind: self.kind,
            total_time_secs: self.total_time.as_secs_f64(),
            total_frames: self.total_frames,
            frames_processed: self.frames_processed,
            frames_with_motion: self.frames_with_motion,
            detector_invocations: self.detector_invocations,
            total_detections: self.total_detections(),
            avg_frame_ms,
            fps: self.fps,
            cancelled: self.cancelled,
        }
    }
}

/// Frame-free projection of a [`ProcessingResult`] for reports.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingSummary {
    pub kind: PassKind,
    pub total_time_secs: f64,
    pub total_frames: u64,
    pub frames_processed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames_with_motion: Option<u64>,
    pub detector_invocations: u64,
    pub total_detections: u64,
    pub avg_frame_ms: f64,
    pub fps: f64,
    pub cancelled: bool,
}
