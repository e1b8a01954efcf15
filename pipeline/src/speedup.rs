use serde::Serialize;
use std::time::Duration;

use crate::result::ProcessingResult;

/// How much the gated pass saved over the always-detect pass. Times are in
/// seconds. Every ratio with a zero denominator is reported as 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedupMetrics {
    pub two_stage_time: f64,
    pub baseline_time: f64,
    pub speedup: f64,
    pub speedup_percent: f64,
    /// Negative when gating overhead outweighs the skipped detector calls.
    pub time_saved: f64,
    pub frames_skipped: i64,
    #[serde(rename = "yolo_reduction_percent")]
    pub detector_reduction_percent: f64,
}

/// Compare a two-stage pass against a baseline pass over the same video.
pub fn compare(two_stage: &ProcessingResult, baseline: &ProcessingResult) -> SpeedupMetrics {
    SpeedupMetrics::from_parts(
        two_stage.total_time,
        baseline.total_time,
        baseline.total_frames,
        two_stage.detector_invocations,
    )
}

impl SpeedupMetrics {
    pub fn from_parts(
        two_stage_time: Duration,
        baseline_time: Duration,
        baseline_total_frames: u64,
        two_stage_invocations: u64,
    ) -> Self {
        let two_stage = two_stage_time.as_secs_f64();
        let baseline = baseline_time.as_secs_f64();

        let speedup = if two_stage > 0.0 { baseline / two_stage } else { 0.0 };
        let speedup_percent = if baseline > 0.0 {
            (baseline - two_stage) / baseline * 100.0
        } else {
            0.0
        };
        let detector_reduction_percent = if baseline_total_frames > 0 {
            (1.0 - two_stage_invocations as f64 / baseline_total_frames as f64) * 100.0
        } else {
            0.0
        };

        Self {
            two_stage_time: two_stage,
            baseline_time: baseline,
            speedup,
            speedup_percent,
            time_saved: baseline - two_stage,
            frames_skipped: baseline_total_frames as i64 - two_stage_invocations as i64,
            detector_reduction_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::RunControl;
    use crate::detector::MockDetector;
    use crate::gate::MotionGate;
    use crate::{BaselinePipeline, TwoStagePipeline};
    use framegate_source::{Pattern, SyntheticSource};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn gated_pass_four_times_faster() {
        let m = SpeedupMetrics::from_parts(ms(500), ms(2000), 100, 25);
        assert!((m.speedup - 4.0).abs() < 1e-9);
        assert!((m.speedup_percent - 75.0).abs() < 1e-9);
        assert!((m.time_saved - 1.5).abs() < 1e-9);
        assert_eq!(m.frames_skipped, 75);
        assert!((m.detector_reduction_percent - 75.0).abs() < 1e-9);
    }

    #[test]
    fn zero_times_are_guarded() {
        let m = SpeedupMetrics::from_parts(Duration::ZERO, Duration::ZERO, 0, 0);
        assert_eq!(m.speedup, 0.0);
        assert_eq!(m.speedup_percent, 0.0);
        assert_eq!(m.detector_reduction_percent, 0.0);
        assert_eq!(m.time_saved, 0.0);

        let m = SpeedupMetrics::from_parts(Duration::ZERO, ms(100), 10, 0);
        assert_eq!(m.speedup, 0.0);
        assert!((m.speedup_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn slower_gated_pass_is_reported_not_rejected() {
        let m = SpeedupMetrics::from_parts(ms(1200), ms(1000), 30, 30);
        assert!(m.time_saved < 0.0);
        assert!(m.speedup < 1.0);
        assert!(m.speedup_percent < 0.0);
        assert_eq!(m.frames_skipped, 0);
        assert_eq!(m.detector_reduction_percent, 0.0);
    }

    #[test]
    fn frames_skipped_can_go_negative() {
        // Container under-reported its frame count.
        let m = SpeedupMetrics::from_parts(ms(10), ms(10), 5, 8);
        assert_eq!(m.frames_skipped, -3);
    }

    #[test]
    fn reduction_stays_in_range() {
        for invocations in 0..=40 {
            let m = SpeedupMetrics::from_parts(ms(1), ms(1), 40, invocations);
            assert!((0.0..=100.0).contains(&m.detector_reduction_percent));
        }
    }

    #[test]
    fn all_motion_source_gives_no_real_speedup() {
        let latency = ms(5);
        let mut pipeline = TwoStagePipeline::new(MotionGate::with_threshold(100));
        let mut source = SyntheticSource::new(Pattern::Flicker, 32, 24, 30.0, 20);
        let two_stage = pipeline
            .run(
                &mut source,
                &mut MockDetector::always().with_latency(latency),
                &mut RunControl::new(),
            )
            .unwrap();

        let mut source = SyntheticSource::new(Pattern::Flicker, 32, 24, 30.0, 20);
        let baseline = BaselinePipeline::new()
            .run(
                &mut source,
                &mut MockDetector::always().with_latency(latency),
                &mut RunControl::new(),
            )
            .unwrap();

        // Only the cold-start frame escapes the detector.
        assert_eq!(two_stage.detector_invocations, two_stage.frames_processed - 1);
        let m = compare(&two_stage, &baseline);
        assert!(m.speedup > 0.5 && m.speedup < 2.0, "speedup {}", m.speedup);
        assert_eq!(m.frames_skipped, 1);
    }

    #[test]
    fn serializes_with_report_field_names() {
        let m = SpeedupMetrics::from_parts(ms(500), ms(1000), 10, 5);
        let json = serde_json::to_value(m).unwrap();
        assert_eq!(json["frames_skipped"], 5);
        assert_eq!(json["yolo_reduction_percent"], 50.0);
        assert!(json.get("detector_reduction_percent").is_none());
    }
}
