use framegate_common::{BoundingBox, Detection, Frame};
use opencv::core::{Point, Rect, Scalar};
use opencv::imgproc;

use crate::imaging::{mat_to_rgb, rgb_to_mat};

// Frames are RGB inside the matrix, so colors are (r, g, b).
const BOX_COLOR: (f64, f64, f64) = (0.0, 255.0, 0.0);
const MOTION_COLOR: (f64, f64, f64) = (0.0, 255.0, 0.0);
const STILL_COLOR: (f64, f64, f64) = (255.0, 0.0, 0.0);
const BOX_THICKNESS: i32 = 2;
const FONT: i32 = imgproc::FONT_HERSHEY_SIMPLEX;
const LABEL_SCALE: f64 = 0.5;
const LABEL_THICKNESS: i32 = 1;
const STATUS_SCALE: f64 = 1.0;
const STATUS_THICKNESS: i32 = 2;
/// Baseline-left corner of the status line.
const STATUS_ORIGIN: (i32, i32) = (10, 30);

pub const MOTION_TEXT: &str = "MOTION";
pub const STILL_TEXT: &str = "NO MOTION";

/// Copy of `frame` with detection boxes and labels drawn on it, plus the
/// motion status line when `motion` is given. The input frame is untouched.
///
/// Boxes are clipped to the frame; a box lying wholly outside it is skipped
/// together with its label.
pub fn annotate(
    frame: &Frame,
    detections: &[Detection],
    motion: Option<bool>,
) -> opencv::Result<Frame> {
    if frame.pixel_count() == 0 || (detections.is_empty() && motion.is_none()) {
        return Ok(frame.clone());
    }
    let (width, height) = (frame.width() as i32, frame.height() as i32);
    let mut mat = rgb_to_mat(frame.image())?;

    for det in detections {
        let Some(rect) = clip_box(det.bounding_box, width, height) else {
            continue;
        };
        imgproc::rectangle(
            &mut mat,
            rect,
            color(BOX_COLOR),
            BOX_THICKNESS,
            imgproc::LINE_8,
            0,
        )?;

        let label = det.label();
        let mut baseline = 0;
        let size = imgproc::get_text_size(&label, FONT, LABEL_SCALE, LABEL_THICKNESS, &mut baseline)?;
        imgproc::put_text(
            &mut mat,
            &label,
            label_origin(rect, size.height),
            FONT,
            LABEL_SCALE,
            color(BOX_COLOR),
            LABEL_THICKNESS,
            imgproc::LINE_8,
            false,
        )?;
    }

    if let Some(motion) = motion {
        let (text, rgb) = if motion {
            (MOTION_TEXT, MOTION_COLOR)
        } else {
            (STILL_TEXT, STILL_COLOR)
        };
        imgproc::put_text(
            &mut mat,
            text,
            Point::new(STATUS_ORIGIN.0, STATUS_ORIGIN.1),
            FONT,
            STATUS_SCALE,
            color(rgb),
            STATUS_THICKNESS,
            imgproc::LINE_8,
            false,
        )?;
    }

    Ok(Frame::new(frame.index(), mat_to_rgb(&mat)?))
}

fn color((r, g, b): (f64, f64, f64)) -> Scalar {
    Scalar::new(r, g, b, 0.0)
}

/// Intersection of a detector box (inclusive corners, either orientation)
/// with a `width` x `height` frame.
fn clip_box(b: BoundingBox, width: i32, height: i32) -> Option<Rect> {
    let (x1, x2) = (b.x1.min(b.x2), b.x1.max(b.x2));
    let (y1, y2) = (b.y1.min(b.y2), b.y1.max(b.y2));
    if x2 < 0 || y2 < 0 || x1 >= width || y1 >= height {
        return None;
    }
    let (x1, x2) = (x1.max(0), x2.min(width - 1));
    let (y1, y2) = (y1.max(0), y2.min(height - 1));
    Some(Rect::new(x1, y1, x2 - x1 + 1, y2 - y1 + 1))
}

/// Label baseline: just above the box, or inside its top edge when there is
/// no room above.
fn label_origin(rect: Rect, text_height: i32) -> Point {
    let above = rect.y - 5;
    let y = if above - text_height >= 0 {
        above
    } else {
        rect.y.saturating_add(text_height).saturating_add(BOX_THICKNESS + 2)
    };
    Point::new(rect.x, y)
}
