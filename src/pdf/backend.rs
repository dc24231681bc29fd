//! Document collaborator contract
//!
//! The viewer core never parses or rasterizes documents itself. It talks to
//! an already-open document through this trait.

use super::error::Result;
use super::types::{Glyph, RasterBuffer, Size};

/// Capabilities the core needs from a document library
pub trait DocumentBackend {
    /// Number of pages in the document
    fn page_count(&self) -> usize;

    /// Page size in document units (1/72 inch)
    fn page_size(&self, page: usize) -> Result<Size>;

    /// Rasterize a page at `scale` relative to `dpi`.
    ///
    /// A failure here is page-local; callers must not treat it as fatal for
    /// the document.
    fn render_page(&self, page: usize, scale: f32, dpi: f32) -> Result<RasterBuffer>;

    /// Page text in reading order, with document-space glyph boxes
    /// (origin bottom-left)
    fn page_text(&self, page: usize) -> Result<Vec<Glyph>>;

    /// All page sizes, in page order
    fn page_sizes(&self) -> Result<Vec<Size>> {
        (0..self.page_count()).map(|p| self.page_size(p)).collect()
    }
}
