//! ffprobe metadata for a video file.

use framegate_common::VideoInfo;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

use crate::SourceError;

/// Used when the container does not report a usable frame rate.
const FALLBACK_FPS: f64 = 30.0;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
    #[serde(default)]
    side_data_list: Vec<FfprobeSideData>,
    #[serde(default)]
    tags: Option<FfprobeTags>,
}

#[derive(Debug, Deserialize)]
struct FfprobeSideData {
    rotation: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FfprobeTags {
    rotate: Option<String>,
}

impl FfprobeStream {
    /// Display rotation in degrees, from the display matrix side data or the
    /// legacy `rotate` tag.
    fn rotation(&self) -> i64 {
        self.side_data_list
            .iter()
            .find_map(|d| d.rotation)
            .or_else(|| {
                self.tags
                    .as_ref()
                    .and_then(|t| t.rotate.as_deref())
                    .and_then(|r| r.trim().parse::<f64>().ok())
            })
            .map(|deg| deg.round() as i64)
            .unwrap_or(0)
    }
}

/// Probe fps, frame count and dimensions of the first video stream.
pub fn probe_video(path: &Path) -> Result<VideoInfo, SourceError> {
    if !path.exists() {
        return Err(SourceError::FileNotFound(path.to_path_buf()));
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => SourceError::FfprobeNotFound,
            _ => SourceError::Io(e),
        })?;

    if !output.status.success() {
        return Err(SourceError::FfprobeFailed(
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ));
    }

    let info = parse_probe_output(&output.stdout)?;
    debug!(
        path = path.display().to_string(),
        fps = info.fps,
        frame_count = info.frame_count,
        width = info.width,
        height = info.height,
        "probed video"
    );
    Ok(info)
}

fn parse_probe_output(json: &[u8]) -> Result<VideoInfo, SourceError> {
    let probe: FfprobeOutput = serde_json::from_slice(json)?;

    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| SourceError::InvalidVideo("no video stream found".into()))?;

    let fps = [&stream.avg_frame_rate, &stream.r_frame_rate]
        .into_iter()
        .flatten()
        .filter_map(|r| parse_frame_rate(r))
        .find(|fps| *fps > 0.0)
        .unwrap_or(FALLBACK_FPS);

    // nb_frames is missing for many containers; estimate from duration then.
    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .or_else(|| {
            stream
                .duration
                .as_deref()
                .or(probe.format.as_ref().and_then(|f| f.duration.as_deref()))
                .and_then(|d| d.parse::<f64>().ok())
                .map(|secs| (secs * fps).round().max(0.0) as u64)
        })
        .unwrap_or(0);

    // ffmpeg autorotates on decode, so quarter-turned streams come out with
    // width and height swapped relative to the coded size.
    let (mut width, mut height) = (stream.width.unwrap_or(0), stream.height.unwrap_or(0));
    if stream.rotation().rem_euclid(180) == 90 {
        std::mem::swap(&mut width, &mut height);
    }

    Ok(VideoInfo {
        fps,
        frame_count,
        width,
        height,
    })
}

/// Parse frame rate string (e.g., "30/1" or "29.97").
fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("29.97").unwrap() - 29.97).abs() < 0.01);
        assert!(parse_frame_rate("0/0").is_none());
    }

    #[test]
    fn parse_uses_nb_frames_when_present() {
        let json = br#"{
            "streams": [
                {"codec_type": "audio"},
                {"codec_type": "video", "width": 640, "height": 480,
                 "avg_frame_rate": "30/1", "r_frame_rate": "30/1", "nb_frames": "150"}
            ],
            "format": {"duration": "5.0"}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.width, 640);
        assert_eq!(info.height, 480);
        assert_eq!(info.frame_count, 150);
        assert!((info.fps - 30.0).abs() < 1e-9);
    }

    #[test]
    fn parse_estimates_frame_count_from_duration() {
        let json = br#"{
            "streams": [
                {"codec_type": "video", "width": 320, "height": 240,
                 "avg_frame_rate": "0/0", "r_frame_rate": "25/1"}
            ],
            "format": {"duration": "4.0"}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert!((info.fps - 25.0).abs() < 1e-9);
        assert_eq!(info.frame_count, 100);
    }

    #[test]
    fn quarter_turn_side_data_swaps_dimensions() {
        let json = br#"{
            "streams": [
                {"codec_type": "video", "width": 1920, "height": 1080,
                 "avg_frame_rate": "30/1", "nb_frames": "10",
                 "side_data_list": [
                    {"side_data_type": "Display Matrix", "rotation": -90}
                 ]}
            ]
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!((info.width, info.height), (1080, 1920));
    }

    #[test]
    fn legacy_rotate_tag_swaps_dimensions() {
        let json = br#"{
            "streams": [
                {"codec_type": "video", "width": 1280, "height": 720,
                 "avg_frame_rate": "30/1", "tags": {"rotate": "270"}}
            ]
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!((info.width, info.height), (720, 1280));
    }

    #[test]
    fn half_turn_keeps_dimensions() {
        let json = br#"{
            "streams": [
                {"codec_type": "video", "width": 1920, "height": 1080,
                 "avg_frame_rate": "30/1",
                 "side_data_list": [{"side_data_type": "Display Matrix", "rotation": 180}]}
            ]
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!((info.width, info.height), (1920, 1080));
    }

    #[test]
    fn parse_without_video_stream_is_invalid() {
        let json = br#"{"streams": [{"codec_type": "audio"}]}"#;
        assert!(matches!(
            parse_probe_output(json),
            Err(SourceError::InvalidVideo(_))
        ));
    }

    #[test]
    fn missing_file_is_reported_before_spawning() {
        let err = probe_video(Path::new("/definitely/not/here.mp4")).unwrap_err();
        assert!(matches!(err, SourceError::FileNotFound(_)));
    }
}
