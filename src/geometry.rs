//! Box geometry and coordinate transforms.
//!
//! Boxes are edited in pixel space (two integer corners plus a class id) and
//! stored as normalized center-form records. This module converts between
//! the two representations; it holds no state.

// ============================================================================
// Pixel Space
// ============================================================================

/// A point in displayed-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned box in pixel space with an integer class label.
///
/// Constructors that take drawn corners keep `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelBox {
    /// Left edge
    pub x1: i32,
    /// Top edge
    pub y1: i32,
    /// Right edge
    pub x2: i32,
    /// Bottom edge
    pub y2: i32,
    /// Class label
    pub class_id: u32,
}

impl PixelBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32, class_id: u32) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            class_id,
        }
    }

    /// A box with every pixel field zero, waiting to be drawn.
    pub fn empty(class_id: u32) -> Self {
        Self {
            class_id,
            ..Self::default()
        }
    }

    /// Create a box from two opposite corners in any order.
    pub fn from_corners(a: Point, b: Point, class_id: u32) -> Self {
        Self {
            x1: a.x.min(b.x),
            y1: a.y.min(b.y),
            x2: a.x.max(b.x),
            y2: a.y.max(b.y),
            class_id,
        }
    }

    /// Check if a point lies inside the box, edges included.
    pub fn contains(&self, point: Point) -> bool {
        self.x1 <= point.x && point.x <= self.x2 && self.y1 <= point.y && point.y <= self.y2
    }

    pub fn width(&self) -> i64 {
        i64::from(self.x2) - i64::from(self.x1)
    }

    pub fn height(&self) -> i64 {
        i64::from(self.y2) - i64::from(self.y1)
    }

    /// Same rectangle with a different class label.
    pub fn with_class(self, class_id: u32) -> Self {
        Self { class_id, ..self }
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.x2, self.y2)
    }
}

// ============================================================================
// Normalized Space
// ============================================================================

/// A box as stored on disk: class id plus center, width and height divided
/// by the image dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedRecord {
    pub class_id: u32,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl NormalizedRecord {
    pub fn new(class_id: u32, cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self {
            class_id,
            cx,
            cy,
            w,
            h,
        }
    }
}

/// Convert a pixel box to its normalized record.
///
/// Values are not clamped: a box drawn past the image edge yields
/// coordinates outside `[0, 1]`.
pub fn to_normalized(bbox: &PixelBox, image_width: u32, image_height: u32) -> NormalizedRecord {
    let width = f64::from(image_width);
    let height = f64::from(image_height);

    let cx = (f64::from(bbox.x1) + f64::from(bbox.x2)) / 2.0 / width;
    let cy = (f64::from(bbox.y1) + f64::from(bbox.y2)) / 2.0 / height;
    let w = bbox.width() as f64 / width;
    let h = bbox.height() as f64 / height;

    NormalizedRecord::new(bbox.class_id, cx, cy, w, h)
}

/// Convert a normalized record back to pixel space.
///
/// Width and height are truncated to whole pixels first, then the corners are
/// placed around the untruncated center, so the conversion is lossy for
/// records that were not produced from integer boxes. Corners that fall
/// outside the `i32` range saturate at its bounds.
pub fn to_pixel(record: &NormalizedRecord, image_width: u32, image_height: u32) -> PixelBox {
    let width = f64::from(image_width);
    let height = f64::from(image_height);

    let center_x = record.cx * width;
    let center_y = record.cy * height;
    let box_width = truncate(record.w * width);
    let box_height = truncate(record.h * height);

    let x1 = truncate(center_x - box_width as f64 / 2.0);
    let y1 = truncate(center_y - box_height as f64 / 2.0);

    PixelBox::new(
        saturate(x1),
        saturate(y1),
        saturate(x1 + box_width),
        saturate(y1 + box_height),
        record.class_id,
    )
}

/// Tolerance under which a scaled value is treated as the integer it is
/// meant to be.
const SNAP_EPSILON: f64 = 1e-6;

/// Truncate toward zero, snapping values within float noise of an integer.
///
/// Dividing by the image size and multiplying back can land a hair below a
/// whole pixel; plain truncation would then lose that pixel. The result
/// is bounded to the `i32` range, so sums of two results fit in `i64`.
fn truncate(value: f64) -> i64 {
    let value = value.clamp(f64::from(i32::MIN), f64::from(i32::MAX));
    let rounded = value.round();
    if (value - rounded).abs() < SNAP_EPSILON {
        rounded as i64
    } else {
        value.trunc() as i64
    }
}

fn saturate(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}
