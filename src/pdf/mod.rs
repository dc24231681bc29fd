//! Document viewing core: windowed rendering, zoom/pan, redaction, search

mod backend;
mod cache;
mod config;
mod error;
mod geometry;
mod layout;
#[cfg(feature = "pdf")]
mod mupdf_backend;
mod redaction;
mod search;
mod state;
mod types;
mod viewer;
#[cfg(feature = "pdf")]
pub mod writer;
mod zoom;

pub use backend::DocumentBackend;
pub use cache::{PageRasterEntry, PageRenderCache, PageStatus, RenderTarget, WindowUpdate};
pub use config::ViewerConfig;
pub use error::{Result, ViewerError};
pub use geometry::PageGeometry;
pub use layout::PageLayout;
#[cfg(feature = "pdf")]
pub use mupdf_backend::MupdfDocument;
pub use redaction::{
    BoundsPolicy, DiscardReason, DrawOutcome, MIN_REDACTION_SIZE, Redaction, RedactionMap,
    RedactionStore,
};
pub use search::{MatchPolicy, SearchEngine, SearchResult};
pub use state::{Command, Effect, ViewState};
pub use types::*;
pub use viewer::{PageOverlay, Viewer};
pub use zoom::Zoom;

/// Pages kept rendered around the current page in continuous-scroll mode
pub const SCROLL_PRELOAD_RADIUS: usize = 1;
/// Pages kept rendered around the current page in single-page mode
pub const PAGE_PRELOAD_RADIUS: usize = 3;
/// Rasterization DPI at scale 1.0
pub const DEFAULT_RENDER_DPI: f32 = 288.0;
/// On-screen pixels per inch at scale 1.0
pub const DEFAULT_SCREEN_DPI: f32 = 96.0;
/// Spacing between and around stacked pages, in pixels
pub const DEFAULT_PAGE_GAP: f32 = 10.0;
