//! Viewer facade
//!
//! Routes input (navigation, zoom, pan, draw gestures, search) to the
//! component that owns it, then re-evaluates the render window against the
//! updated [`ViewState`]. Holds no UI toolkit types; any binding layer can
//! drive it.

use log::{debug, info};

use super::backend::DocumentBackend;
use super::cache::{PageRenderCache, RenderTarget, WindowUpdate};
use super::config::ViewerConfig;
use super::error::{Result, ViewerError};
use super::geometry::PageGeometry;
use super::layout::PageLayout;
use super::redaction::{DrawOutcome, Redaction, RedactionStore};
use super::search::{SearchEngine, SearchResult};
use super::state::{Command, Effect, ViewState};
use super::types::{Point, Rect, Size};
use super::zoom::Zoom;

/// Everything tied to the lifetime of one open document
struct LoadedDocument {
    backend: Box<dyn DocumentBackend>,
    layout: PageLayout,
    view: ViewState,
    cache: PageRenderCache,
}

impl LoadedDocument {
    fn refresh_window(&mut self, dpi: f32) -> WindowUpdate {
        let layout = &self.layout;
        let scale = self.view.scale;
        let target = RenderTarget {
            current_page: self.view.current_page,
            scale,
            dpi,
        };
        self.cache
            .on_viewport_changed(target, self.backend.as_ref(), |page| {
                layout.displayed_size(page, scale).unwrap_or_default()
            })
    }

    /// Pick the current page from the scroll position. Window refresh is
    /// left to the caller.
    fn settle(&mut self) {
        let page = self.layout.settle_current_page(
            self.view.current_page,
            self.view.scroll.y,
            self.view.viewport.height,
            self.view.scale,
        );
        let _ = self.view.apply(Command::SettlePage(page));
    }

    fn to_content(&self, at: Point) -> Point {
        Point::new(at.x + self.view.scroll.x, at.y + self.view.scroll.y)
    }

    /// Viewport position of a page's top-left corner
    fn page_screen_origin(&self, page: usize) -> Point {
        let origin = self.layout.page_origin(page, self.view.scale);
        Point::new(origin.x - self.view.scroll.x, origin.y - self.view.scroll.y)
    }

    fn geometry(&self, page: usize) -> Result<PageGeometry> {
        let size = self.layout.page_size(page).ok_or(ViewerError::PageOutOfRange {
            page,
            count: self.layout.page_count(),
        })?;
        let displayed = self
            .cache
            .entry(page)
            .map(|e| e.displayed_size())
            .unwrap_or_default();
        PageGeometry::new(page, size, displayed)
    }
}

/// Screen-space decorations for the current page, in viewport pixels
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageOverlay {
    pub page: usize,
    /// Where the page itself is drawn
    pub page_rect: Rect,
    /// Committed redactions of this page only
    pub redactions: Vec<Rect>,
    /// Search matches on this page
    pub highlights: Vec<Rect>,
    /// The match the search cursor points at, if on this page
    pub active_highlight: Option<Rect>,
    /// Rectangle being drawn, if the gesture is on this page
    pub live: Option<Rect>,
}

/// The viewer core for a single document window
pub struct Viewer {
    config: ViewerConfig,
    viewport: Size,
    doc: Option<LoadedDocument>,
    redactions: RedactionStore,
    search: SearchEngine,
}

impl Viewer {
    #[must_use]
    pub fn new(config: ViewerConfig, viewport: Size) -> Self {
        let redactions = RedactionStore::new(config.min_redaction_size, config.redaction_bounds);
        let search = SearchEngine::new(config.search_matches);
        Self {
            config,
            viewport,
            doc: None,
            redactions,
            search,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Open a document, replacing the current one.
    ///
    /// On failure the viewer keeps whatever was open before.
    pub fn load(&mut self, backend: Box<dyn DocumentBackend>) -> Result<WindowUpdate> {
        let sizes = backend.page_sizes().map_err(|e| match e {
            ViewerError::Document(_) => e,
            other => ViewerError::document(other.to_string()),
        })?;
        if sizes.is_empty() {
            return Err(ViewerError::document("document has no pages"));
        }
        let page_count = sizes.len();
        info!("Loaded document with {page_count} pages");

        let layout = PageLayout::new(sizes, self.config.screen_dpi, self.config.page_gap);
        let scale = self.config.zoom.clamp_factor(self.config.default_scale);
        let mut doc = LoadedDocument {
            backend,
            layout,
            view: ViewState::new(page_count, scale, self.viewport),
            cache: PageRenderCache::new(page_count, self.config.preload_radius),
        };
        self.redactions.clear_all();
        self.search.clear();
        let update = doc.refresh_window(self.config.render_dpi);
        self.doc = Some(doc);
        Ok(update)
    }

    /// Close the document, releasing every raster
    pub fn close(&mut self) {
        if self.doc.take().is_some() {
            info!("Closed document");
        }
        self.redactions.clear_all();
        self.search.clear();
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.doc.is_some()
    }

    #[must_use]
    pub fn view(&self) -> Option<&ViewState> {
        self.doc.as_ref().map(|d| &d.view)
    }

    #[must_use]
    pub fn cache(&self) -> Option<&PageRenderCache> {
        self.doc.as_ref().map(|d| &d.cache)
    }

    #[must_use]
    pub fn layout(&self) -> Option<&PageLayout> {
        self.doc.as_ref().map(|d| &d.layout)
    }

    #[must_use]
    pub fn document(&self) -> Option<&dyn DocumentBackend> {
        self.doc.as_ref().map(|d| d.backend.as_ref())
    }

    #[must_use]
    pub fn redactions(&self) -> &RedactionStore {
        &self.redactions
    }

    /// Mutable access, e.g. to restore redactions from a sidecar
    pub fn redactions_mut(&mut self) -> &mut RedactionStore {
        &mut self.redactions
    }

    #[must_use]
    pub fn search_engine(&self) -> &SearchEngine {
        &self.search
    }

    fn loaded(&mut self) -> Result<&mut LoadedDocument> {
        self.doc.as_mut().ok_or(ViewerError::NotLoaded)
    }

    fn dispatch(&mut self, cmd: Command) -> Result<WindowUpdate> {
        let dpi = self.config.render_dpi;
        let doc = self.loaded()?;
        let effects = doc.view.apply(cmd);
        Ok(Self::run_effects(doc, effects, dpi))
    }

    fn run_effects(doc: &mut LoadedDocument, effects: Vec<Effect>, dpi: f32) -> WindowUpdate {
        let mut update = WindowUpdate::default();
        for effect in effects {
            match effect {
                Effect::ScrollToPage(page) => {
                    doc.view.scroll.y = doc.layout.scroll_offset_for_page(page, doc.view.scale);
                    Zoom::clamp_scroll(&mut doc.view, &doc.layout);
                }
                Effect::ClampScroll => Zoom::clamp_scroll(&mut doc.view, &doc.layout),
                Effect::UpdateWindow => {
                    let step = doc.refresh_window(dpi);
                    update.rendered.extend(step.rendered);
                    update.evicted.extend(step.evicted);
                    update.failed.extend(step.failed);
                }
            }
        }
        update
    }

    pub fn go_to_page(&mut self, page: usize) -> Result<WindowUpdate> {
        self.dispatch(Command::GoToPage(page))
    }

    pub fn next_page(&mut self) -> Result<WindowUpdate> {
        self.dispatch(Command::NextPage)
    }

    pub fn prev_page(&mut self) -> Result<WindowUpdate> {
        self.dispatch(Command::PrevPage)
    }

    /// Resize the visible area
    pub fn set_viewport(&mut self, viewport: Size) -> Result<WindowUpdate> {
        self.viewport = viewport;
        if self.doc.is_none() {
            return Ok(WindowUpdate::default());
        }
        self.dispatch(Command::SetViewport(viewport))
    }

    /// Zoom around `anchor` (viewport pixels) by a wheel delta
    pub fn on_scroll(&mut self, delta: f32, anchor: Point) -> Result<WindowUpdate> {
        let zoom = self.config.zoom;
        let dpi = self.config.render_dpi;
        let doc = self.loaded()?;
        if !zoom.on_scroll(&mut doc.view, &doc.layout, delta, anchor) {
            return Ok(WindowUpdate::default());
        }
        debug!("Zoomed to {:.3}", doc.view.scale);
        doc.settle();
        Ok(doc.refresh_window(dpi))
    }

    /// Pan by `delta` pixels
    pub fn on_pan(&mut self, delta: Point) -> Result<WindowUpdate> {
        let zoom = self.config.zoom;
        let dpi = self.config.render_dpi;
        let doc = self.loaded()?;
        if !zoom.on_pan(&mut doc.view, &doc.layout, delta) {
            return Ok(WindowUpdate::default());
        }
        doc.settle();
        Ok(doc.refresh_window(dpi))
    }

    /// Screen/document transform for a rendered page
    pub fn page_geometry(&self, page: usize) -> Result<PageGeometry> {
        self.doc.as_ref().ok_or(ViewerError::NotLoaded)?.geometry(page)
    }

    /// Page under a viewport point and the point relative to that page
    #[must_use]
    pub fn hit_test(&self, at: Point) -> Option<(usize, Point)> {
        let doc = self.doc.as_ref()?;
        doc.layout.hit_test(doc.to_content(at), doc.view.scale)
    }

    /// Press: start a redaction on the page under the pointer, making that
    /// page current so the overlay and undo act on it.
    /// Returns false when the pointer is not over a page.
    pub fn begin_draw(&mut self, at: Point) -> Result<bool> {
        let dpi = self.config.render_dpi;
        let doc = self.doc.as_mut().ok_or(ViewerError::NotLoaded)?;
        let Some((page, local)) = doc.layout.hit_test(doc.to_content(at), doc.view.scale) else {
            return Ok(false);
        };
        if page != doc.view.current_page {
            debug!("Drawing on page {page}, making it current");
            let effects = doc.view.apply(Command::SettlePage(page));
            Self::run_effects(doc, effects, dpi);
        }
        self.redactions.begin_draw(page, local);
        Ok(true)
    }

    /// Drag: returns the live rectangle in viewport pixels
    pub fn update_draw(&mut self, at: Point) -> Option<Rect> {
        let doc = self.doc.as_ref()?;
        let (page, _) = self.redactions.live()?;
        let origin = doc.page_screen_origin(page);
        let live = self
            .redactions
            .update_draw(Point::new(at.x - origin.x, at.y - origin.y))?;
        Some(Rect::new(live.x + origin.x, live.y + origin.y, live.width, live.height))
    }

    /// Release: commit or discard the gesture
    pub fn end_draw(&mut self, at: Point) -> Result<DrawOutcome> {
        let Some(doc) = self.doc.as_ref() else {
            self.redactions.cancel_draw();
            return Err(ViewerError::NotLoaded);
        };
        let local = match self.redactions.live() {
            Some((page, _)) => {
                let origin = doc.page_screen_origin(page);
                Point::new(at.x - origin.x, at.y - origin.y)
            }
            None => at,
        };
        self.redactions.end_draw(local, |page| doc.geometry(page))
    }

    /// Undo the latest redaction on the current page
    pub fn undo_last(&mut self) -> Result<Option<Redaction>> {
        let page = self.view().ok_or(ViewerError::NotLoaded)?.current_page;
        Ok(self.redactions.undo_last(page))
    }

    pub fn clear_redactions(&mut self) {
        self.redactions.clear_all();
    }

    /// Run a new search; the current page is left alone
    pub fn search(&mut self, query: &str) -> &[SearchResult] {
        let doc = self.doc.as_ref().map(|d| d.backend.as_ref());
        self.search.search(doc, query)
    }

    /// Show the next search result, navigating to its page
    pub fn search_next(&mut self) -> Option<SearchResult> {
        let result = self.search.next()?.clone();
        self.show_result(&result);
        Some(result)
    }

    /// Show the previous search result, navigating to its page
    pub fn search_previous(&mut self) -> Option<SearchResult> {
        let result = self.search.previous()?.clone();
        self.show_result(&result);
        Some(result)
    }

    fn show_result(&mut self, result: &SearchResult) {
        if let Err(e) = self.go_to_page(result.page) {
            debug!("Cannot show search result: {e}");
        }
    }

    /// Decorations to draw over the current page. Redactions of other pages
    /// are never included.
    pub fn overlay(&self) -> Result<PageOverlay> {
        let doc = self.doc.as_ref().ok_or(ViewerError::NotLoaded)?;
        let page = doc.view.current_page;
        let origin = doc.page_screen_origin(page);
        let displayed = doc
            .layout
            .displayed_size(page, doc.view.scale)
            .unwrap_or_default();
        let mut overlay = PageOverlay {
            page,
            page_rect: Rect::new(origin.x, origin.y, displayed.width, displayed.height),
            ..PageOverlay::default()
        };

        let Ok(geometry) = doc.geometry(page) else {
            // Nothing can be positioned on a page without a raster
            return Ok(overlay);
        };
        let place = |r: &Rect| {
            let s = geometry.rect_to_screen(r);
            Rect::new(s.x + origin.x, s.y + origin.y, s.width, s.height)
        };

        overlay.redactions = self
            .redactions
            .redactions(page)
            .iter()
            .map(|r| place(&r.rect))
            .collect();
        overlay.highlights = self
            .search
            .results_on_page(page)
            .map(|r| place(&r.rect))
            .collect();
        overlay.active_highlight = self
            .search
            .current()
            .filter(|r| r.page == page)
            .map(|r| place(&r.rect));
        overlay.live = self
            .redactions
            .live()
            .filter(|(p, _)| *p == page)
            .map(|(_, r)| Rect::new(r.x + origin.x, r.y + origin.y, r.width, r.height));
        Ok(overlay)
    }

    /// "Page n of m", or a notice when nothing is open
    #[must_use]
    pub fn page_label(&self) -> String {
        match self.view() {
            Some(view) => format!("Page {} of {}", view.current_page + 1, view.page_count),
            None => "No document loaded.".to_string(),
        }
    }

    /// "i/n" or "No results found" for the last search
    #[must_use]
    pub fn search_status(&self) -> Option<String> {
        self.search.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::search::MatchPolicy;
    use crate::pdf::{Glyph, RasterBuffer};
    use crate::test_utils::FakeDocument;

    /// One document unit per screen pixel, 10px gaps
    fn config() -> ViewerConfig {
        ViewerConfig {
            screen_dpi: 72.0,
            render_dpi: 72.0,
            ..ViewerConfig::default()
        }
    }

    fn viewer_with(doc: FakeDocument) -> Viewer {
        let mut viewer = Viewer::new(config(), Size::new(120.0, 150.0));
        viewer.load(Box::new(doc)).expect("fake loads");
        viewer
    }

    #[test]
    fn operations_without_document() {
        let mut viewer = Viewer::new(config(), Size::new(100.0, 100.0));
        assert!(matches!(viewer.go_to_page(1), Err(ViewerError::NotLoaded)));
        assert!(matches!(
            viewer.on_pan(Point::new(0.0, 10.0)),
            Err(ViewerError::NotLoaded)
        ));
        assert!(viewer.search("foo").is_empty());
        assert!(viewer.search_next().is_none());
        assert_eq!(viewer.page_label(), "No document loaded.");
        assert!(matches!(viewer.end_draw(Point::default()), Err(ViewerError::NotLoaded)));
    }

    #[test]
    fn load_renders_initial_window() {
        let viewer = viewer_with(FakeDocument::uniform(3));
        assert_eq!(viewer.cache().unwrap().rendered_pages(), vec![0, 1]);
        assert_eq!(viewer.page_label(), "Page 1 of 3");
    }

    #[test]
    fn empty_document_is_rejected_and_previous_kept() {
        let mut viewer = viewer_with(FakeDocument::uniform(3));
        let result = viewer.load(Box::new(FakeDocument::uniform(0)));
        assert!(matches!(result, Err(ViewerError::Document(_))));
        assert_eq!(viewer.view().unwrap().page_count, 3);
        assert_eq!(viewer.page_label(), "Page 1 of 3");
        assert_eq!(viewer.cache().unwrap().rendered_pages(), vec![0, 1]);
    }

    #[test]
    fn failed_load_keeps_previous_document() {
        struct Broken;
        impl DocumentBackend for Broken {
            fn page_count(&self) -> usize {
                1
            }
            fn page_size(&self, _: usize) -> Result<Size> {
                Err(ViewerError::document("truncated xref"))
            }
            fn render_page(&self, page: usize, _: f32, _: f32) -> Result<RasterBuffer> {
                Err(ViewerError::render(page, "unreachable"))
            }
            fn page_text(&self, _: usize) -> Result<Vec<Glyph>> {
                Ok(Vec::new())
            }
        }

        let mut viewer = viewer_with(FakeDocument::uniform(3));
        let err = viewer.load(Box::new(Broken)).unwrap_err();
        assert!(matches!(err, ViewerError::Document(_)));
        assert_eq!(viewer.view().unwrap().page_count, 3);
    }

    #[test]
    fn panning_past_midpoint_advances_page() {
        let mut viewer = viewer_with(FakeDocument::uniform(5));
        // Page 1 starts at content y = 120; the midpoint is scroll + 75
        viewer.on_pan(Point::new(0.0, 40.0)).unwrap();
        assert_eq!(viewer.view().unwrap().current_page, 0);
        viewer.on_pan(Point::new(0.0, 10.0)).unwrap();
        assert_eq!(viewer.view().unwrap().current_page, 1);
        assert_eq!(viewer.cache().unwrap().rendered_pages(), vec![0, 1, 2]);
    }

    #[test]
    fn zoom_rerenders_at_new_scale() {
        let mut viewer = viewer_with(FakeDocument::uniform(3));
        let update = viewer.on_scroll(10.0, Point::new(50.0, 50.0)).unwrap();
        assert!(!update.rendered.is_empty());
        let scale = viewer.view().unwrap().scale;
        let geometry = viewer.page_geometry(0).unwrap();
        assert!((geometry.displayed.width - 100.0 * scale).abs() < 1e-3);
    }

    #[test]
    fn draw_commits_on_page_under_pointer() {
        let mut viewer = viewer_with(FakeDocument::uniform(3));
        // Page 0 occupies viewport (10,10)-(110,110)
        assert!(viewer.begin_draw(Point::new(20.0, 20.0)).unwrap());
        let live = viewer.update_draw(Point::new(40.0, 35.0)).unwrap();
        assert_eq!(live, Rect::new(20.0, 20.0, 20.0, 15.0));

        let outcome = viewer.end_draw(Point::new(40.0, 35.0)).unwrap();
        let DrawOutcome::Committed(r) = outcome else {
            panic!("expected commit, got {outcome:?}");
        };
        assert_eq!(r.page, 0);
        assert_eq!(r.rect, Rect::new(10.0, 75.0, 20.0, 15.0));

        let overlay = viewer.overlay().unwrap();
        assert_eq!(overlay.redactions, vec![Rect::new(20.0, 20.0, 20.0, 15.0)]);

        assert_eq!(viewer.undo_last().unwrap(), Some(r));
        assert!(viewer.redactions().is_empty());
    }

    #[test]
    fn press_in_gap_starts_nothing() {
        let mut viewer = viewer_with(FakeDocument::uniform(3));
        assert!(!viewer.begin_draw(Point::new(5.0, 5.0)).unwrap());
        assert!(viewer.update_draw(Point::new(50.0, 50.0)).is_none());
    }

    #[test]
    fn overlay_shows_only_current_page_redactions() {
        let mut viewer = viewer_with(FakeDocument::uniform(3));
        viewer.begin_draw(Point::new(20.0, 20.0)).unwrap();
        viewer.end_draw(Point::new(60.0, 60.0)).unwrap();
        viewer.go_to_page(1).unwrap();

        let overlay = viewer.overlay().unwrap();
        assert_eq!(overlay.page, 1);
        assert!(overlay.redactions.is_empty());
        assert_eq!(viewer.redactions().redactions(0).len(), 1);
    }

    #[test]
    fn search_navigation_moves_current_page() {
        let doc = FakeDocument::uniform(5)
            .with_text(2, "the foo")
            .with_text(4, "foo again");
        let mut viewer = viewer_with(doc);

        assert!(viewer.search("").is_empty());
        assert_eq!(viewer.view().unwrap().current_page, 0);

        assert_eq!(viewer.search("FOO").len(), 2);
        assert_eq!(viewer.view().unwrap().current_page, 0);

        assert_eq!(viewer.search_previous().map(|r| r.page), Some(4));
        assert_eq!(viewer.view().unwrap().current_page, 4);
        assert_eq!(viewer.search_status().as_deref(), Some("2/2"));

        assert_eq!(viewer.search_next().map(|r| r.page), Some(2));
        assert_eq!(viewer.view().unwrap().current_page, 2);
        let overlay = viewer.overlay().unwrap();
        assert_eq!(overlay.highlights.len(), 1);
        assert_eq!(overlay.active_highlight, Some(overlay.highlights[0]));
    }

    #[test]
    fn all_matches_policy_reaches_viewer() {
        let doc = FakeDocument::uniform(1).with_text(0, "ab ab ab");
        let mut viewer = Viewer::new(
            ViewerConfig {
                search_matches: MatchPolicy::All,
                ..config()
            },
            Size::new(120.0, 150.0),
        );
        viewer.load(Box::new(doc)).unwrap();
        assert_eq!(viewer.search("ab").len(), 3);
    }

    #[test]
    fn geometry_requires_raster() {
        let viewer = viewer_with(FakeDocument::uniform(5));
        assert!(viewer.page_geometry(1).is_ok());
        assert!(matches!(
            viewer.page_geometry(4),
            Err(ViewerError::NotRendered { page: 4 })
        ));
    }
}
