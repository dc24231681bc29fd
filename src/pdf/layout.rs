//! Continuous-scroll page layout
//!
//! Pages are stacked in a single column, separated (and surrounded) by a
//! fixed gap. All positions here are in content pixels, i.e. view space
//! before the scroll offset is subtracted.

use super::geometry::PageGeometry;
use super::types::{Point, Size};

/// Geometry of the whole document strip, independent of the current scale
#[derive(Clone, Debug)]
pub struct PageLayout {
    sizes: Vec<Size>,
    /// Cumulative unscaled page heights; `prefix[i]` is the sum of pages `0..i`
    prefix: Vec<f32>,
    max_width: f32,
    px_per_unit: f32,
    gap: f32,
}

impl PageLayout {
    /// `screen_dpi` maps document units (1/72 inch) to on-screen pixels at scale 1.0
    #[must_use]
    pub fn new(sizes: Vec<Size>, screen_dpi: f32, gap: f32) -> Self {
        let mut prefix = Vec::with_capacity(sizes.len() + 1);
        let mut acc = 0.0;
        prefix.push(acc);
        for s in &sizes {
            acc += s.height;
            prefix.push(acc);
        }
        let max_width = sizes.iter().map(|s| s.width).fold(0.0, f32::max);
        Self {
            sizes,
            prefix,
            max_width,
            px_per_unit: screen_dpi / 72.0,
            gap: gap.max(0.0),
        }
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.sizes.len()
    }

    #[must_use]
    pub fn page_size(&self, page: usize) -> Option<Size> {
        self.sizes.get(page).copied()
    }

    #[must_use]
    pub fn gap(&self) -> f32 {
        self.gap
    }

    fn k(&self, scale: f32) -> f32 {
        scale * self.px_per_unit
    }

    /// On-screen size of a page at `scale`
    #[must_use]
    pub fn displayed_size(&self, page: usize, scale: f32) -> Option<Size> {
        self.page_size(page).map(|s| s.scaled(self.k(scale)))
    }

    /// Transform for a page at `scale`; `None` for an unknown page
    #[must_use]
    pub fn geometry(&self, page: usize, scale: f32) -> Option<PageGeometry> {
        let size = self.page_size(page)?;
        PageGeometry::new(page, size, size.scaled(self.k(scale))).ok()
    }

    /// Content-space top-left corner of a page
    #[must_use]
    pub fn page_origin(&self, page: usize, scale: f32) -> Point {
        let page = page.min(self.sizes.len());
        Point::new(
            self.gap,
            self.gap * (page as f32 + 1.0) + self.prefix[page] * self.k(scale),
        )
    }

    #[must_use]
    pub fn page_top(&self, page: usize, scale: f32) -> f32 {
        self.page_origin(page, scale).y
    }

    #[must_use]
    pub fn page_bottom(&self, page: usize, scale: f32) -> f32 {
        let height = self.sizes.get(page).map_or(0.0, |s| s.height * self.k(scale));
        self.page_top(page, scale) + height
    }

    /// Total size of the scrollable content
    #[must_use]
    pub fn content_size(&self, scale: f32) -> Size {
        let n = self.sizes.len();
        if n == 0 {
            return Size::default();
        }
        Size::new(
            self.max_width * self.k(scale) + 2.0 * self.gap,
            self.page_top(n, scale),
        )
    }

    /// Scroll offset that puts the page (and the gap above it) at the top
    #[must_use]
    pub fn scroll_offset_for_page(&self, page: usize, scale: f32) -> f32 {
        (self.page_top(page, scale) - self.gap).max(0.0)
    }

    /// Find the page under a content-space point, returning the page index
    /// and the point relative to the page's top-left corner
    #[must_use]
    pub fn hit_test(&self, content: Point, scale: f32) -> Option<(usize, Point)> {
        let n = self.sizes.len();
        if n == 0 {
            return None;
        }
        // Binary search for the last page whose top is above the point
        let (mut lo, mut hi) = (0, n);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.page_top(mid, scale) <= content.y {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        let page = lo.checked_sub(1)?;
        let origin = self.page_origin(page, scale);
        let size = self.displayed_size(page, scale)?;
        let local = Point::new(content.x - origin.x, content.y - origin.y);
        if local.x < 0.0 || local.x > size.width || local.y > size.height {
            return None;
        }
        Some((page, local))
    }

    /// Apply the viewport-middle policy: move forward while the next page's
    /// top edge is above the viewport midpoint, move back while the previous
    /// page's bottom edge is below it. Inside a gap the page stays put.
    #[must_use]
    pub fn settle_current_page(
        &self,
        current: usize,
        scroll_y: f32,
        viewport_height: f32,
        scale: f32,
    ) -> usize {
        let n = self.sizes.len();
        if n == 0 {
            return 0;
        }
        let midpoint = scroll_y + viewport_height / 2.0;
        let mut page = current.min(n - 1);
        while page + 1 < n && self.page_top(page + 1, scale) < midpoint {
            page += 1;
        }
        while page > 0 && self.page_bottom(page - 1, scale) > midpoint {
            page -= 1;
        }
        page
    }
}
