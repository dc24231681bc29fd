//! In-memory document backend for tests

use std::cell::Cell;
use std::collections::{HashMap, HashSet};

use crate::pdf::{DocumentBackend, Glyph, RasterBuffer, Rect, Size, ViewerError};

/// Default page size of [`FakeDocument::uniform`], in document units
pub const FAKE_PAGE_SIZE: Size = Size::new(100.0, 100.0);

/// Glyph advance used when laying out fake page text
pub const FAKE_GLYPH_WIDTH: f32 = 6.0;
pub const FAKE_GLYPH_HEIGHT: f32 = 10.0;

/// A document whose pages, text and failures are scripted by the test
#[derive(Debug, Default)]
pub struct FakeDocument {
    sizes: Vec<Size>,
    text: HashMap<usize, String>,
    broken_pages: HashSet<usize>,
    unreadable_pages: HashSet<usize>,
    render_calls: Cell<usize>,
}

impl FakeDocument {
    /// `count` pages of [`FAKE_PAGE_SIZE`]
    #[must_use]
    pub fn uniform(count: usize) -> Self {
        Self::with_sizes(vec![FAKE_PAGE_SIZE; count])
    }

    #[must_use]
    pub fn with_sizes(sizes: Vec<Size>) -> Self {
        Self {
            sizes,
            ..Self::default()
        }
    }

    /// Set the single-line text of a page
    #[must_use]
    pub fn with_text(mut self, page: usize, text: &str) -> Self {
        self.text.insert(page, text.to_string());
        self
    }

    /// Make the rasterizer fail for a page
    #[must_use]
    pub fn with_broken_page(mut self, page: usize) -> Self {
        self.broken_pages.insert(page);
        self
    }

    /// Make text extraction fail for a page
    #[must_use]
    pub fn with_unreadable_text(mut self, page: usize) -> Self {
        self.unreadable_pages.insert(page);
        self
    }

    /// Number of `render_page` calls so far
    #[must_use]
    pub fn render_calls(&self) -> usize {
        self.render_calls.get()
    }

    /// Document-space box of the `index`-th glyph of a page's text.
    ///
    /// Text starts 10 units from the left edge, with its top 20 units below
    /// the top of the page.
    #[must_use]
    pub fn glyph_rect(&self, page: usize, index: usize) -> Rect {
        let height = self.sizes.get(page).map_or(0.0, |s| s.height);
        Rect::new(
            10.0 + index as f32 * FAKE_GLYPH_WIDTH,
            height - 20.0 - FAKE_GLYPH_HEIGHT,
            FAKE_GLYPH_WIDTH,
            FAKE_GLYPH_HEIGHT,
        )
    }

    fn check_page(&self, page: usize) -> Result<Size, ViewerError> {
        self.sizes
            .get(page)
            .copied()
            .ok_or(ViewerError::PageOutOfRange {
                page,
                count: self.sizes.len(),
            })
    }
}

impl DocumentBackend for FakeDocument {
    fn page_count(&self) -> usize {
        self.sizes.len()
    }

    fn page_size(&self, page: usize) -> Result<Size, ViewerError> {
        self.check_page(page)
    }

    fn render_page(&self, page: usize, scale: f32, dpi: f32) -> Result<RasterBuffer, ViewerError> {
        let size = self.check_page(page)?;
        self.render_calls.set(self.render_calls.get() + 1);
        if self.broken_pages.contains(&page) {
            return Err(ViewerError::render(page, "corrupt content stream"));
        }
        let k = scale * dpi / 72.0;
        let width_px = (size.width * k).round().max(1.0) as u32;
        let height_px = (size.height * k).round().max(1.0) as u32;
        Ok(RasterBuffer {
            pixels: vec![0xFF; (width_px * height_px * 3) as usize],
            width_px,
            height_px,
        })
    }

    fn page_text(&self, page: usize) -> Result<Vec<Glyph>, ViewerError> {
        self.check_page(page)?;
        if self.unreadable_pages.contains(&page) {
            return Err(ViewerError::document(format!("no text layer on page {page}")));
        }
        let text = self.text.get(&page).map_or("", String::as_str);
        Ok(text
            .chars()
            .enumerate()
            .map(|(i, c)| Glyph::new(c, self.glyph_rect(page, i)))
            .collect())
    }
}
