//! MuPDF-backed document collaborator

use std::path::Path;

use log::{debug, info};
use mupdf::text_page::TextBlockType;
use mupdf::{Colorspace, Document, Matrix, Page, Pixmap, TextPageFlags};

use super::backend::DocumentBackend;
use super::error::{Result, ViewerError};
use super::types::{Glyph, RasterBuffer, Rect, Size};

/// Upper bound for either raster dimension, to keep a single page from
/// allocating unbounded memory at extreme zoom
const MAX_RASTER_DIMENSION: f32 = 16_384.0;

/// An open document rendered through MuPDF
pub struct MupdfDocument {
    doc: Document,
    page_count: usize,
}

impl std::fmt::Debug for MupdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MupdfDocument")
            .field("page_count", &self.page_count)
            .finish_non_exhaustive()
    }
}

impl MupdfDocument {
    /// Open a document from disk
    pub fn open(path: &Path) -> Result<Self> {
        let doc = Document::open(path.to_string_lossy().as_ref())
            .map_err(|e| ViewerError::document(format!("{}: {e}", path.display())))?;
        let opened = Self::from_document(doc)?;
        info!("Opened {} ({} pages)", path.display(), opened.page_count);
        Ok(opened)
    }

    /// Parse a PDF held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = Document::from_bytes(bytes, "application/pdf")
            .map_err(|e| ViewerError::document(e.to_string()))?;
        Self::from_document(doc)
    }

    fn from_document(doc: Document) -> Result<Self> {
        let count = doc
            .page_count()
            .map_err(|e| ViewerError::document(e.to_string()))?;
        Ok(Self {
            doc,
            page_count: usize::try_from(count).unwrap_or(0),
        })
    }

    fn load_page(&self, page: usize) -> Result<Page> {
        if page >= self.page_count {
            return Err(ViewerError::PageOutOfRange {
                page,
                count: self.page_count,
            });
        }
        self.doc
            .load_page(page as i32)
            .map_err(|e| ViewerError::render(page, e.to_string()))
    }
}

impl DocumentBackend for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_size(&self, page: usize) -> Result<Size> {
        let bounds = self
            .load_page(page)?
            .bounds()
            .map_err(|e| ViewerError::document(e.to_string()))?;
        Ok(Size::new(bounds.x1 - bounds.x0, bounds.y1 - bounds.y0))
    }

    fn render_page(&self, page: usize, scale: f32, dpi: f32) -> Result<RasterBuffer> {
        let loaded = self.load_page(page)?;
        let bounds = loaded
            .bounds()
            .map_err(|e| ViewerError::render(page, e.to_string()))?;

        let mut mag = scale * dpi / 72.0;
        let max_dim = (bounds.x1 - bounds.x0).max(bounds.y1 - bounds.y0) * mag;
        if max_dim > MAX_RASTER_DIMENSION {
            mag *= MAX_RASTER_DIMENSION / max_dim;
            debug!("Page {page} raster capped at {MAX_RASTER_DIMENSION}px");
        }

        let pixmap = loaded
            .to_pixmap(
                &Matrix::new_scale(mag, mag),
                &Colorspace::device_rgb(),
                false,
                true,
            )
            .map_err(|e| ViewerError::render(page, e.to_string()))?;

        Ok(RasterBuffer {
            pixels: pixmap_to_rgb(&pixmap).map_err(|detail| ViewerError::render(page, detail))?,
            width_px: pixmap.width(),
            height_px: pixmap.height(),
        })
    }

    fn page_text(&self, page: usize) -> Result<Vec<Glyph>> {
        let loaded = self.load_page(page)?;
        let bounds = loaded
            .bounds()
            .map_err(|e| ViewerError::document(e.to_string()))?;
        let text_page = loaded
            .to_text_page(TextPageFlags::empty())
            .map_err(|e| ViewerError::document(e.to_string()))?;

        // MuPDF reports y growing downward from the page top; flip to a
        // bottom-left origin.
        let page_height = bounds.y1 - bounds.y0;
        let mut glyphs = Vec::new();

        for block in text_page.blocks() {
            if block.r#type() != TextBlockType::Text {
                continue;
            }
            for line in block.lines() {
                let bbox = line.bounds();
                let y = page_height - (bbox.y1 - bounds.y0);
                let height = (bbox.y1 - bbox.y0).abs();

                let chars: Vec<(char, f32)> = line
                    .chars()
                    .filter_map(|ch| ch.char().map(|c| (c, ch.origin().x - bounds.x0)))
                    .collect();
                if chars.is_empty() {
                    continue;
                }

                let line_end = bbox.x1 - bounds.x0;
                for (i, &(c, x)) in chars.iter().enumerate() {
                    let next_x = chars.get(i + 1).map_or(line_end, |&(_, nx)| nx);
                    glyphs.push(Glyph::new(c, Rect::new(x, y, (next_x - x).max(0.0), height)));
                }

                // Separate lines so words across a line break do not fuse
                if chars.last().is_some_and(|&(c, _)| !c.is_whitespace()) {
                    glyphs.push(Glyph::new(' ', Rect::new(line_end, y, 0.0, height)));
                }
            }
        }

        Ok(glyphs)
    }
}

fn pixmap_to_rgb(pixmap: &Pixmap) -> std::result::Result<Vec<u8>, String> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(format!("Unsupported pixmap format: {n} channels"));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    let expected_min = stride.saturating_mul(height);
    if samples.len() < expected_min || row_bytes > stride {
        return Err("Pixmap buffer size mismatch".to_string());
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row_start = y * stride;
        let row = &samples[row_start..row_start + row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }

    Ok(out)
}
