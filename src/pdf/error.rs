//! Error taxonomy for the viewer core

/// Errors surfaced by the viewer core and its document collaborator
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// Operation needs an open document
    #[error("No document loaded")]
    NotLoaded,

    /// Coordinate conversion before the page has a raster
    #[error("Page {page} has not been rendered")]
    NotRendered { page: usize },

    /// Rasterizer failure, isolated to a single page
    #[error("Failed to render page {page}: {detail}")]
    Render { page: usize, detail: String },

    /// Load/parse failure of the whole document
    #[error("Document error: {0}")]
    Document(String),

    #[error("Page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },

    #[error("Failed to save document: {0}")]
    Save(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ViewerError {
    pub fn render(page: usize, detail: impl Into<String>) -> Self {
        Self::Render {
            page,
            detail: detail.into(),
        }
    }

    pub fn document(detail: impl Into<String>) -> Self {
        Self::Document(detail.into())
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
