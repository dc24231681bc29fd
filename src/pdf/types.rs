//! Core types for document geometry and rasterization

use serde::{Deserialize, Serialize};

/// A point in either screen or document space
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Width and height, in document units or pixels depending on context
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }

    /// True when either dimension is zero or not a finite positive number
    #[must_use]
    pub fn is_degenerate(self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

/// Axis-aligned rectangle anchored at `(x, y)` with non-negative extent.
///
/// In screen space `(x, y)` is the top-left corner; in document space it is
/// the bottom-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized rectangle spanning two arbitrary corners
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    #[must_use]
    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    #[must_use]
    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    /// Smallest rectangle covering both
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.max_x().max(other.max_x());
        let y1 = self.max_y().max(other.max_y());
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Intersection with `[0, bounds.width] x [0, bounds.height]`, if non-empty
    #[must_use]
    pub fn clamp_to(&self, bounds: Size) -> Option<Rect> {
        let x0 = self.x.clamp(0.0, bounds.width);
        let y0 = self.y.clamp(0.0, bounds.height);
        let x1 = self.max_x().clamp(0.0, bounds.width);
        let y1 = self.max_y().clamp(0.0, bounds.height);
        if x1 <= x0 || y1 <= y0 {
            None
        } else {
            Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
        }
    }

    /// True if the rectangle lies within `[0, bounds.width] x [0, bounds.height]`
    #[must_use]
    pub fn within(&self, bounds: Size) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.max_x() <= bounds.width && self.max_y() <= bounds.height
    }
}

/// A single glyph of page text with its document-space bounding box
#[derive(Clone, Debug, PartialEq)]
pub struct Glyph {
    pub c: char,
    pub bounds: Rect,
}

impl Glyph {
    #[must_use]
    pub const fn new(c: char, bounds: Rect) -> Self {
        Self { c, bounds }
    }
}

/// Raw rendered page image.
///
/// RGB pixel data (3 bytes per pixel) as produced by the rasterizer.
#[derive(Clone)]
pub struct RasterBuffer {
    pub pixels: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl RasterBuffer {
    /// Size of the pixel payload in bytes
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

impl std::fmt::Debug for RasterBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterBuffer")
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}
