//! Tunables for the viewer core

use super::redaction::{BoundsPolicy, MIN_REDACTION_SIZE};
use super::search::MatchPolicy;
use super::zoom::Zoom;
use super::{DEFAULT_PAGE_GAP, DEFAULT_RENDER_DPI, DEFAULT_SCREEN_DPI, SCROLL_PRELOAD_RADIUS};

/// Everything the core needs to know that is not part of the document
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    /// Scale a freshly loaded document starts at
    pub default_scale: f32,
    pub zoom: Zoom,
    /// Pages kept rendered on each side of the current page
    pub preload_radius: usize,
    /// DPI pages are rasterized at for scale 1.0
    pub render_dpi: f32,
    /// DPI mapping document units to on-screen pixels for scale 1.0
    pub screen_dpi: f32,
    /// Pixels between stacked pages
    pub page_gap: f32,
    pub min_redaction_size: f32,
    pub redaction_bounds: BoundsPolicy,
    pub search_matches: MatchPolicy,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_scale: 1.0,
            zoom: Zoom::default(),
            preload_radius: SCROLL_PRELOAD_RADIUS,
            render_dpi: DEFAULT_RENDER_DPI,
            screen_dpi: DEFAULT_SCREEN_DPI,
            page_gap: DEFAULT_PAGE_GAP,
            min_redaction_size: MIN_REDACTION_SIZE,
            redaction_bounds: BoundsPolicy::default(),
            search_matches: MatchPolicy::default(),
        }
    }
}
