use framegate_common::config::DetectorConfig;
use framegate_common::{BoundingBox, Detection, Frame};
use image::codecs::jpeg::JpegEncoder;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{DetectorError, ObjectDetector};

const JPEG_QUALITY: u8 = 90;

/// Detector backed by an HTTP inference service.
///
/// Each call POSTs the frame as a JPEG body to the configured endpoint with
/// the threshold in the query string (`?confidence=0.5`). The service answers
/// with a JSON array:
///
/// ```json
/// [{"class": "person", "confidence": 0.91, "box": [12, 40, 180, 300]}]
/// ```
///
/// Only the connect phase has a timeout; an inference call may take as long
/// as the service needs.
pub struct HttpDetector {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct WireDetection {
    class: String,
    confidence: f32,
    #[serde(rename = "box")]
    bbox: [f64; 4],
}

impl HttpDetector {
    pub fn new(config: &DetectorConfig) -> Result<Self, DetectorError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(None::<Duration>)
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

impl ObjectDetector for HttpDetector {
    fn detect(&mut self, frame: &Frame, confidence: f32) -> Result<Vec<Detection>, DetectorError> {
        let body = encode_jpeg(frame)?;
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("confidence", confidence)])
            .header(CONTENT_TYPE, "image/jpeg")
            .body(body)
            .send()?;

        if !response.status().is_success() {
            return Err(DetectorError::Status(response.status().as_u16()));
        }

        let bytes = response.bytes()?;
        let detections = parse_response(&bytes, confidence)?;
        debug!(
            frame = frame.index(),
            detections = detections.len(),
            "http detector responded"
        );
        Ok(detections)
    }

    fn name(&self) -> &str {
        "http"
    }
}

fn encode_jpeg(frame: &Frame) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY).encode_image(frame.image())?;
    Ok(buf)
}

fn parse_response(body: &[u8], confidence: f32) -> Result<Vec<Detection>, serde_json::Error> {
    let wire: Vec<WireDetection> = serde_json::from_slice(body)?;
    Ok(wire
        .into_iter()
        .filter(|d| d.confidence >= confidence)
        .map(|d| {
            let [x1, y1, x2, y2] = d.bbox.map(|v| v.round() as i32);
            Detection::new(d.class, d.confidence, BoundingBox::new(x1, y1, x2, y2))
        })
        .collect())
}
