//! Coordinate conversions between pixel, normalized and document-point space.
//!
//! Three spaces are in play:
//!
//! - **Pixel space**: the rendered page image, origin top-left. Depends on the
//!   zoom/DPI the page was rasterized at.
//! - **Normalized space**: fractions of the page width/height in `[0, 1]`,
//!   origin top-left. This is what fields store.
//! - **Document-point space**: the page in document units, origin bottom-left.
//!
//! Everything here is a pure function. Callers pass the dimension source that
//! matches the space they are converting into: rendered pixel dimensions for
//! the editor, document point dimensions for output.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use serde::{Deserialize, Serialize};

use crate::consts::MIN_SIZE;

/// A point in pixel space, relative to the top-left of a page image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of a page, in whatever unit the caller's space uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    pub width: f64,
    pub height: f64,
}

impl PageDimensions {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl PixelRect {
    #[must_use]
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }
}

/// Field position and size as fractions of the page, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl FieldRect {
    #[must_use]
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

/// Rectangle in document points, origin bottom-left.
///
/// `(x0, y0)` is the bottom-left corner and `(x1, y1)` the top-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

/// Convert a pixel rect to normalized space. `dims` must be positive.
#[must_use]
pub fn to_normalized(rect: PixelRect, dims: PageDimensions) -> FieldRect {
    FieldRect {
        x: rect.x / dims.width,
        y: rect.y / dims.height,
        w: rect.w / dims.width,
        h: rect.h / dims.height,
    }
}

/// Convert a normalized rect back to pixel space.
#[must_use]
pub fn to_pixels(rect: FieldRect, dims: PageDimensions) -> PixelRect {
    PixelRect {
        x: rect.x * dims.width,
        y: rect.y * dims.height,
        w: rect.w * dims.width,
        h: rect.h * dims.height,
    }
}

/// Map a normalized rect onto a document page with a bottom-left origin.
#[must_use]
pub fn to_document_points(rect: FieldRect, dims: PageDimensions) -> DocRect {
    DocRect {
        x0: rect.x * dims.width,
        y0: dims.height - (rect.y + rect.h) * dims.height,
        x1: (rect.x + rect.w) * dims.width,
        y1: dims.height - rect.y * dims.height,
    }
}

/// Build a rect with non-negative size from the two corners of a drag,
/// whichever direction the pointer travelled.
#[must_use]
pub fn normalize_drag(start_x: f64, start_y: f64, end_x: f64, end_y: f64) -> PixelRect {
    PixelRect {
        x: start_x.min(end_x),
        y: start_y.min(end_y),
        w: (end_x - start_x).abs(),
        h: (end_y - start_y).abs(),
    }
}

/// Inclusive containment test on both axes.
#[must_use]
pub fn contains_point(rect: PixelRect, px: f64, py: f64) -> bool {
    px >= rect.x && px <= rect.right() && py >= rect.y && py <= rect.bottom()
}

/// Whether both sides meet the minimum field size.
#[must_use]
pub fn is_viable_size(rect: FieldRect) -> bool {
    rect.w >= MIN_SIZE && rect.h >= MIN_SIZE
}
