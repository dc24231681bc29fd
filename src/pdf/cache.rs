//! Windowed page cache for rendered pages
//!
//! Keeps rasters only for pages within `radius` of the current page. Pages
//! leaving the window drop their pixels immediately; there is no LRU grace
//! period.

use std::ops::Range;
use std::sync::Arc;

use log::{debug, warn};

use super::backend::DocumentBackend;
use super::types::{RasterBuffer, Size};

/// What a page currently shows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageStatus {
    /// No raster yet, or evicted
    Blank,
    /// Raster available
    Rendered,
    /// Rasterizer failed; an error placeholder is shown
    Failed,
}

/// Cache slot for a single page. Identity is the page index.
#[derive(Clone, Debug)]
pub struct PageRasterEntry {
    page: usize,
    pixels: Option<Arc<RasterBuffer>>,
    /// Scale the current pixels were rendered at
    scale: f32,
    /// On-screen size of the current pixels
    displayed: Size,
    failure: Option<String>,
}

impl PageRasterEntry {
    fn new(page: usize) -> Self {
        Self {
            page,
            pixels: None,
            scale: 0.0,
            displayed: Size::default(),
            failure: None,
        }
    }

    #[must_use]
    pub fn page(&self) -> usize {
        self.page
    }

    /// True exactly when pixels are held
    #[must_use]
    pub fn rendered(&self) -> bool {
        self.pixels.is_some()
    }

    #[must_use]
    pub fn pixels(&self) -> Option<&Arc<RasterBuffer>> {
        self.pixels.as_ref()
    }

    /// On-screen size of the rendered raster; zero when not rendered
    #[must_use]
    pub fn displayed_size(&self) -> Size {
        if self.rendered() {
            self.displayed
        } else {
            Size::default()
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    #[must_use]
    pub fn status(&self) -> PageStatus {
        if self.failure.is_some() {
            PageStatus::Failed
        } else if self.rendered() {
            PageStatus::Rendered
        } else {
            PageStatus::Blank
        }
    }

    fn store(&mut self, raster: RasterBuffer, scale: f32, displayed: Size) {
        self.pixels = Some(Arc::new(raster));
        self.scale = scale;
        self.displayed = displayed;
    }

    fn evict(&mut self) {
        self.pixels = None;
        self.scale = 0.0;
        self.displayed = Size::default();
    }
}

/// Pages touched by one window re-evaluation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WindowUpdate {
    pub rendered: Vec<usize>,
    pub evicted: Vec<usize>,
    pub failed: Vec<usize>,
}

impl WindowUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty() && self.evicted.is_empty() && self.failed.is_empty()
    }
}

/// Parameters of a render pass
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderTarget {
    pub current_page: usize,
    pub scale: f32,
    pub dpi: f32,
}

/// Windowed render cache, one entry per page
pub struct PageRenderCache {
    entries: Vec<PageRasterEntry>,
    radius: usize,
}

impl PageRenderCache {
    /// Create entries for every page, all unrendered
    #[must_use]
    pub fn new(page_count: usize, radius: usize) -> Self {
        Self {
            entries: (0..page_count).map(PageRasterEntry::new).collect(),
            radius,
        }
    }

    #[must_use]
    pub fn radius(&self) -> usize {
        self.radius
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entry(&self, page: usize) -> Option<&PageRasterEntry> {
        self.entries.get(page)
    }

    pub fn entries(&self) -> impl Iterator<Item = &PageRasterEntry> {
        self.entries.iter()
    }

    /// Pages currently holding pixels, ascending
    #[must_use]
    pub fn rendered_pages(&self) -> Vec<usize> {
        self.entries
            .iter()
            .filter(|e| e.rendered())
            .map(PageRasterEntry::page)
            .collect()
    }

    /// Total bytes of raster data held
    #[must_use]
    pub fn memory_bytes(&self) -> usize {
        self.entries
            .iter()
            .filter_map(|e| e.pixels.as_ref())
            .map(|p| p.byte_len())
            .sum()
    }

    /// `[current - radius, current + radius]` intersected with the page range
    #[must_use]
    pub fn window(&self, current_page: usize) -> Range<usize> {
        let n = self.entries.len();
        if n == 0 {
            return 0..0;
        }
        let current = current_page.min(n - 1);
        current.saturating_sub(self.radius)..(current + self.radius + 1).min(n)
    }

    /// Render pages entering the window and evict pages leaving it.
    ///
    /// Pages rendered at a different scale are re-rendered. A page whose
    /// render fails is marked failed and skipped from then on; other pages
    /// are unaffected.
    pub fn on_viewport_changed(
        &mut self,
        target: RenderTarget,
        backend: &dyn DocumentBackend,
        displayed_size: impl Fn(usize) -> Size,
    ) -> WindowUpdate {
        let window = self.window(target.current_page);
        let mut update = WindowUpdate::default();

        for entry in &mut self.entries {
            if window.contains(&entry.page) || !entry.rendered() {
                continue;
            }
            entry.evict();
            update.evicted.push(entry.page);
        }

        for page in window {
            let entry = &mut self.entries[page];
            if entry.failure.is_some() {
                continue;
            }
            let stale = (entry.scale - target.scale).abs() > f32::EPSILON;
            if entry.rendered() && !stale {
                continue;
            }
            match backend.render_page(page, target.scale, target.dpi) {
                Ok(raster) => {
                    entry.store(raster, target.scale, displayed_size(page));
                    update.rendered.push(page);
                }
                Err(e) => {
                    warn!("Page {page} failed to render, showing placeholder: {e}");
                    entry.evict();
                    entry.failure = Some(e.to_string());
                    update.failed.push(page);
                }
            }
        }

        if !update.is_empty() {
            debug!(
                "Render window around page {}: rendered {:?}, evicted {:?}, failed {:?}, {} bytes held",
                target.current_page,
                update.rendered,
                update.evicted,
                update.failed,
                self.memory_bytes()
            );
        }
        update
    }
}
