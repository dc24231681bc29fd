//! Conversion between screen space and document space for a single page.
//!
//! Document space is page-local, unscaled, with its origin at the
//! bottom-left corner. Screen space is the pixel space of the displayed page
//! with its origin at the top-left corner.

use super::error::{Result, ViewerError};
use super::types::{Point, Rect, Size};

/// Transform parameters for one displayed page
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    /// Page index the transform belongs to
    pub page: usize,
    /// Page size in document units
    pub page_size: Size,
    /// On-screen size of the rendered page in pixels
    pub displayed: Size,
}

impl PageGeometry {
    /// Build a transform, failing if the page has no usable on-screen size
    pub fn new(page: usize, page_size: Size, displayed: Size) -> Result<Self> {
        if displayed.is_degenerate() || page_size.is_degenerate() {
            return Err(ViewerError::NotRendered { page });
        }
        Ok(Self {
            page,
            page_size,
            displayed,
        })
    }

    fn x_ratio(&self) -> f32 {
        self.page_size.width / self.displayed.width
    }

    fn y_ratio(&self) -> f32 {
        self.page_size.height / self.displayed.height
    }

    #[must_use]
    pub fn to_document(&self, screen: Point) -> Point {
        Point::new(
            screen.x * self.x_ratio(),
            self.page_size.height - screen.y * self.y_ratio(),
        )
    }

    #[must_use]
    pub fn to_screen(&self, doc: Point) -> Point {
        Point::new(
            doc.x / self.x_ratio(),
            (self.page_size.height - doc.y) / self.y_ratio(),
        )
    }

    /// Map a screen rectangle (top-left anchored) to document space
    /// (bottom-left anchored)
    #[must_use]
    pub fn rect_to_document(&self, screen: &Rect) -> Rect {
        let top_left = self.to_document(Point::new(screen.x, screen.y));
        let bottom_right = self.to_document(Point::new(screen.max_x(), screen.max_y()));
        Rect::from_corners(top_left, bottom_right)
    }

    #[must_use]
    pub fn rect_to_screen(&self, doc: &Rect) -> Rect {
        let bottom_left = self.to_screen(Point::new(doc.x, doc.y));
        let top_right = self.to_screen(Point::new(doc.max_x(), doc.max_y()));
        Rect::from_corners(bottom_left, top_right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn letter_at(scale: f32) -> PageGeometry {
        let page = Size::new(612.0, 792.0);
        PageGeometry::new(0, page, page.scaled(scale)).expect("valid geometry")
    }

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn top_left_of_screen_is_top_of_page() {
        let g = letter_at(2.0);
        assert_close(g.to_document(Point::new(0.0, 0.0)), Point::new(0.0, 792.0));
        assert_close(
            g.to_document(Point::new(1224.0, 1584.0)),
            Point::new(612.0, 0.0),
        );
    }

    #[test]
    fn round_trip_across_scales() {
        for scale in [0.1, 0.37, 1.0, 2.5, 5.0] {
            let g = letter_at(scale);
            for p in [
                Point::new(0.0, 0.0),
                Point::new(13.5, 700.25),
                Point::new(g.displayed.width, g.displayed.height),
            ] {
                assert_close(g.to_screen(g.to_document(p)), p);
            }
        }
    }

    #[test]
    fn rect_flips_vertically() {
        let g = letter_at(1.0);
        let doc = g.rect_to_document(&Rect::new(10.0, 20.0, 30.0, 40.0));
        assert!((doc.x - 10.0).abs() < EPS);
        assert!((doc.y - (792.0 - 60.0)).abs() < EPS);
        assert!((doc.width - 30.0).abs() < EPS);
        assert!((doc.height - 40.0).abs() < EPS);

        let back = g.rect_to_screen(&doc);
        assert!((back.y - 20.0).abs() < EPS);
    }

    #[test]
    fn zero_displayed_size_is_not_rendered() {
        let err = PageGeometry::new(3, Size::new(612.0, 792.0), Size::default()).unwrap_err();
        assert!(matches!(err, ViewerError::NotRendered { page: 3 }));
    }
}
