use chrono::{DateTime, Utc};
use framegate_pipeline::{CompressionSummary, ProcessingSummary, SpeedupMetrics};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::CliError;

/// JSON report written by `--report`.
#[derive(Debug, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub video: PathBuf,
    #[serde(flatten)]
    pub body: ReportBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case", tag = "command")]
pub enum ReportBody {
    Gate {
        two_stage: ProcessingSummary,
    },
    Compare {
        two_stage: ProcessingSummary,
        baseline: ProcessingSummary,
        speedup: SpeedupMetrics,
    },
    Compress {
        compression: CompressionSummary,
    },
}

impl Report {
    pub fn new(video: &Path, body: ReportBody) -> Self {
        Self {
            generated_at: Utc::now(),
            video: video.to_path_buf(),
            body,
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), CliError> {
        let report_err = |message: String| CliError::Report {
            path: path.display().to_string(),
            message,
        };
        let json = serde_json::to_string_pretty(self).map_err(|e| report_err(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| report_err(e.to_string()))?;
        info!(path = %path.display(), "report written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn summary() -> ProcessingSummary {
        ProcessingSummary {
            kind: framegate_pipeline::PassKind::TwoStage,
            total_time_secs: 1.5,
            total_frames: 90,
            frames_processed: 90,
            frames_with_motion: Some(12),
            detector_invocations: 12,
            total_detections: 4,
            avg_frame_ms: 16.6,
            fps: 30.0,
            cancelled: false,
        }
    }

    #[test]
    fn compare_report_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let mut baseline = summary();
        baseline.kind = framegate_pipeline::PassKind::Baseline;
        baseline.frames_with_motion = None;
        baseline.detector_invocations = 90;
        let speedup = SpeedupMetrics::from_parts(
            Duration::from_millis(1500),
            Duration::from_millis(4500),
            90,
            12,
        );

        Report::new(
            Path::new("clip.mp4"),
            ReportBody::Compare {
                two_stage: summary(),
                baseline,
                speedup,
            },
        )
        .write(&path)
        .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["command"], "compare");
        assert_eq!(json["video"], "clip.mp4");
        assert_eq!(json["baseline"]["detector_invocations"], 90);
        assert_eq!(json["speedup"]["frames_skipped"], 78);
        let stamp = json["generated_at"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn unwritable_path_is_a_report_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.json");
        let err = Report::new(Path::new("a.mp4"), ReportBody::Gate { two_stage: summary() })
            .write(&path)
            .unwrap_err();
        assert!(matches!(err, CliError::Report { .. }));
    }
}
