use serde::{Deserialize, Serialize};

/// Axis-aligned box in pixel coordinates, `(x1, y1)` top-left and `(x2, y2)`
/// bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<[i32; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [i32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

/// One object reported by a detector. Detectors define the order; nothing
/// downstream assumes it is sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_label: String,
    /// In `[0, 1]`.
    pub confidence: f32,
    pub bounding_box: BoundingBox,
}

impl Detection {
    pub fn new(class_label: impl Into<String>, confidence: f32, bounding_box: BoundingBox) -> Self {
        Self {
            class_label: class_label.into(),
            confidence,
            bounding_box,
        }
    }

    /// Overlay label, e.g. `person (0.91)`.
    pub fn label(&self) -> String {
        format!("{} ({:.2})", self.class_label, self.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_format() {
        let det = Detection::new("person", 0.914, BoundingBox::new(1, 2, 3, 4));
        assert_eq!(det.label(), "person (0.91)");
    }

    #[test]
    fn box_from_array() {
        let b: BoundingBox = [10, 20, 30, 40].into();
        assert_eq!(b, BoundingBox::new(10, 20, 30, 40));
    }
}
