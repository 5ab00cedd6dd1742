//! Bounding boxes tagged with the coordinate space they live in.
//!
//! Three spaces show up while locating a table:
//!
//! - [`ImagePixel`]: raster pixels, origin at the top-left, y grows downward.
//! - [`PdfNormalized`]: the same frame scaled to `[0, 1]` on both axes.
//! - [`PdfAbsolute`]: PDF user space units, origin at the bottom-left,
//!   y grows upward.
//!
//! A [`BBox`] always stores `(x1, y1)` as the top-left corner and
//! `(x2, y2)` as the bottom-right corner *as seen on the page*. In image and
//! normalized space that means `y1 < y2`; in PDF space it means `y1 > y2`,
//! which is the `"x1,y1,x2,y2"` area convention table parsers accept.
//!
//! The space marker is a zero-sized type, so handing an image box to a
//! function that expects a PDF box does not compile.

mod mapper;

pub use mapper::{
    clamp_to_page, pad, to_image, to_normalized, to_pdf_absolute, PageFrame, DEFAULT_MARGIN,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Raster pixel space (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImagePixel;

/// Normalized page space in `[0, 1]` (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PdfNormalized;

/// PDF user space (bottom-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PdfAbsolute;

/// A box in raster pixels.
pub type ImageBox = BBox<ImagePixel>;

/// A box in normalized page coordinates.
pub type NormalizedBox = BBox<PdfNormalized>;

/// A box in PDF user space.
pub type PdfBox = BBox<PdfAbsolute>;

/// An axis-aligned bounding box in coordinate space `S`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct BBox<S> {
    /// Left edge
    pub x1: f64,
    /// Top edge
    pub y1: f64,
    /// Right edge
    pub x2: f64,
    /// Bottom edge
    pub y2: f64,
    #[serde(skip)]
    space: PhantomData<S>,
}

impl<S> BBox<S> {
    /// Create a box from its top-left and bottom-right corners.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            space: PhantomData,
        }
    }

    /// Box covering nothing at the origin.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Coordinates as `[x1, y1, x2, y2]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Horizontal extent.
    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).abs()
    }

    /// Vertical extent.
    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).abs()
    }

    /// Smallest x coordinate.
    pub fn min_x(&self) -> f64 {
        self.x1.min(self.x2)
    }

    /// Largest x coordinate.
    pub fn max_x(&self) -> f64 {
        self.x1.max(self.x2)
    }

    /// Smallest y coordinate.
    pub fn min_y(&self) -> f64 {
        self.y1.min(self.y2)
    }

    /// Largest y coordinate.
    pub fn max_y(&self) -> f64 {
        self.y1.max(self.y2)
    }

    /// Center point.
    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Whether a point lies inside the box (edges included).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x() && x <= self.max_x() && y >= self.min_y() && y <= self.max_y()
    }

    /// Whether any coordinate is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }

    /// Compare coordinates within an absolute tolerance.
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .all(|(a, b)| (a - b).abs() <= eps)
    }

    // Reinterpret coordinates in another space. Only the mapper does this.
    pub(crate) fn retag<T>(self) -> BBox<T> {
        BBox::new(self.x1, self.y1, self.x2, self.y2)
    }
}

impl<S: Space> BBox<S> {
    /// Box from any two opposite corners.
    pub fn from_corners(ax: f64, ay: f64, bx: f64, by: f64) -> Self {
        Self::from_extents(ax.min(bx), ay.min(by), ax.max(bx), ay.max(by))
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Self) -> Self {
        Self::from_extents(
            self.min_x().min(other.min_x()),
            self.min_y().min(other.min_y()),
            self.max_x().max(other.max_x()),
            self.max_y().max(other.max_y()),
        )
    }

    // Build a box from min/max extents, keeping the space's y orientation.
    fn from_extents(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        if S::Y_UP {
            Self::new(min_x, max_y, max_x, min_y)
        } else {
            Self::new(min_x, min_y, max_x, max_y)
        }
    }
}

impl<S> Default for BBox<S> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<S> fmt::Display for BBox<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x1, self.y1, self.x2, self.y2)
    }
}

/// Orientation of a coordinate space.
pub trait Space {
    /// Whether y grows upward.
    const Y_UP: bool;
}

impl Space for ImagePixel {
    const Y_UP: bool = false;
}

impl Space for PdfNormalized {
    const Y_UP: bool = false;
}

impl Space for PdfAbsolute {
    const Y_UP: bool = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_extents() {
        let b = PdfBox::new(10.0, 200.0, 110.0, 150.0);
        assert_eq!(b.width(), 100.0);
        assert_eq!(b.height(), 50.0);
        assert_eq!(b.min_y(), 150.0);
        assert_eq!(b.max_y(), 200.0);
        assert!(b.contains(50.0, 175.0));
        assert!(!b.contains(50.0, 201.0));
    }

    #[test]
    fn test_from_corners_respects_orientation() {
        let pdf = PdfBox::from_corners(0.0, 0.0, 10.0, 20.0);
        assert_eq!(pdf.to_array(), [0.0, 20.0, 10.0, 0.0]);

        let img = ImageBox::from_corners(10.0, 20.0, 0.0, 0.0);
        assert_eq!(img.to_array(), [0.0, 0.0, 10.0, 20.0]);
    }

    #[test]
    fn test_union() {
        let a = PdfBox::new(0.0, 50.0, 10.0, 40.0);
        let b = PdfBox::new(5.0, 80.0, 30.0, 60.0);
        assert_eq!(a.union(&b).to_array(), [0.0, 80.0, 30.0, 40.0]);
    }

    #[test]
    fn test_display_is_area_string() {
        let b = PdfBox::new(72.5, 700.0, 540.0, 400.25);
        assert_eq!(b.to_string(), "72.5,700,540,400.25");
    }

    #[test]
    fn test_serialize_skips_marker() {
        let b = ImageBox::new(1.0, 2.0, 3.0, 4.0);
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, r#"{"x1":1.0,"y1":2.0,"x2":3.0,"y2":4.0}"#);
        let back: ImageBox = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
    }
}
