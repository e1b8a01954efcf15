use framegate_common::{BoundingBox, Detection, Frame};
use std::time::Duration;

use super::{DetectorError, ObjectDetector};

type Pattern = Box<dyn FnMut(u64) -> bool + Send>;

/// Deterministic detector for tests and offline runs.
///
/// Whether a frame yields a detection is decided by a predicate over the
/// frame index; a hit reports one `object` box covering the whole frame.
/// Every call is recorded so tests can check exactly which frames reached
/// the detector.
pub struct MockDetector {
    pattern: Pattern,
    fail_at: Option<u64>,
    latency: Duration,
    calls: Vec<u64>,
}

impl MockDetector {
    pub fn with_pattern(pattern: impl FnMut(u64) -> bool + Send + 'static) -> Self {
        Self {
            pattern: Box::new(pattern),
            fail_at: None,
            latency: Duration::ZERO,
            calls: Vec::new(),
        }
    }

    /// Never finds anything.
    pub fn empty() -> Self {
        Self::with_pattern(|_| false)
    }

    /// Finds an object on every frame.
    pub fn always() -> Self {
        Self::with_pattern(|_| true)
    }

    /// Detects on the listed frame indices only.
    pub fn with_fixed_frames(frames: Vec<u64>) -> Self {
        Self::with_pattern(move |n| frames.contains(&n))
    }

    /// Fail when asked to look at frame `index`.
    pub fn failing_at(mut self, index: u64) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Sleep this long on every call, to stand in for inference cost.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn invocations(&self) -> u64 {
        self.calls.len() as u64
    }

    /// Indices of the frames passed to `detect`, in call order.
    pub fn calls(&self) -> &[u64] {
        &self.calls
    }
}

impl ObjectDetector for MockDetector {
    fn detect(&mut self, frame: &Frame, confidence: f32) -> Result<Vec<Detection>, DetectorError> {
        self.calls.push(frame.index());
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }

        if self.fail_at == Some(frame.index()) {
            return Err(DetectorError::Failed {
                detector: self.name().to_string(),
                frame: frame.index(),
                message: "injected failure".into(),
            });
        }

        if !(self.pattern)(frame.index()) {
            return Ok(Vec::new());
        }

        let bbox = BoundingBox::new(0, 0, frame.width() as i32 - 1, frame.height() as i32 - 1);
        Ok(vec![Detection::new("object", confidence.max(0.9), bbox)])
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_calls_and_follows_pattern() {
        let mut detector = MockDetector::with_fixed_frames(vec![2]);
        let hits: Vec<usize> = (0..4)
            .map(|i| {
                detector
                    .detect(&Frame::solid(i, 4, 4, [0, 0, 0]), 0.5)
                    .unwrap()
                    .len()
            })
            .collect();
        assert_eq!(hits, vec![0, 0, 1, 0]);
        assert_eq!(detector.invocations(), 4);
        assert_eq!(detector.calls(), &[0, 1, 2, 3]);
    }

    #[test]
    fn injected_failure() {
        let mut detector = MockDetector::always().failing_at(1);
        assert!(detector.detect(&Frame::solid(0, 2, 2, [0, 0, 0]), 0.5).is_ok());
        let err = detector
            .detect(&Frame::solid(1, 2, 2, [0, 0, 0]), 0.5)
            .unwrap_err();
        assert!(matches!(err, DetectorError::Failed { frame: 1, .. }));
    }
}
