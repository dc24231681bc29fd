//! View state management

use super::types::{Point, Size};

/// What is on screen for the open document.
///
/// The single source of truth read by the cache, the redaction overlay and
/// search highlighting. Mutated by navigation commands and by the zoom/pan
/// controller.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    /// Current page (0-indexed), always `< page_count` for a non-empty document
    pub current_page: usize,

    /// Zoom factor (1.0 = 100%)
    pub scale: f32,

    /// Scroll offset in view-space pixels
    pub scroll: Point,

    /// Size of the visible area in pixels
    pub viewport: Size,

    /// Total page count
    pub page_count: usize,
}

impl ViewState {
    /// Fresh state for a newly loaded document
    #[must_use]
    pub fn new(page_count: usize, scale: f32, viewport: Size) -> Self {
        Self {
            current_page: 0,
            scale,
            scroll: Point::default(),
            viewport,
            page_count,
        }
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::GoToPage(page) => {
                let clamped = page.min(self.page_count.saturating_sub(1));
                if self.current_page != clamped {
                    self.current_page = clamped;
                    vec![Effect::ScrollToPage(clamped), Effect::UpdateWindow]
                } else {
                    vec![]
                }
            }

            Command::NextPage => self.apply(Command::GoToPage(self.current_page + 1)),

            Command::PrevPage => {
                self.apply(Command::GoToPage(self.current_page.saturating_sub(1)))
            }

            Command::SetViewport(viewport) => {
                if self.viewport != viewport {
                    self.viewport = viewport;
                    vec![Effect::ClampScroll, Effect::UpdateWindow]
                } else {
                    vec![]
                }
            }

            Command::SettlePage(page) => {
                let clamped = page.min(self.page_count.saturating_sub(1));
                if self.current_page != clamped {
                    self.current_page = clamped;
                    vec![Effect::UpdateWindow]
                } else {
                    vec![]
                }
            }
        }
    }
}

/// Commands that modify view state
#[derive(Clone, Debug)]
pub enum Command {
    /// Jump to a page, scrolling it into view
    GoToPage(usize),
    NextPage,
    PrevPage,
    /// Resize the visible area
    SetViewport(Size),
    /// Record the page chosen by the scroll position, without scrolling
    SettlePage(usize),
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Move the scroll offset so the page is at the top
    ScrollToPage(usize),
    /// Re-clamp the scroll offset to the content bounds
    ClampScroll,
    /// Re-evaluate the render window
    UpdateWindow,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> ViewState {
        ViewState::new(10, 1.0, Size::new(800.0, 600.0))
    }

    #[test]
    fn go_to_page_scrolls_and_updates_window() {
        let mut state = test_state();

        let effects = state.apply(Command::GoToPage(5));
        assert_eq!(state.current_page, 5);
        assert_eq!(
            effects,
            vec![Effect::ScrollToPage(5), Effect::UpdateWindow]
        );
    }

    #[test]
    fn go_to_page_clamps_to_max() {
        let mut state = test_state();

        state.apply(Command::GoToPage(999));
        assert_eq!(state.current_page, 9);
    }

    #[test]
    fn go_to_same_page_is_noop() {
        let mut state = test_state();
        assert!(state.apply(Command::GoToPage(0)).is_empty());
    }

    #[test]
    fn prev_page_at_start_is_noop() {
        let mut state = test_state();
        assert!(state.apply(Command::PrevPage).is_empty());
        assert_eq!(state.current_page, 0);

        state.apply(Command::NextPage);
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn settle_page_does_not_scroll() {
        let mut state = test_state();
        let effects = state.apply(Command::SettlePage(3));
        assert_eq!(state.current_page, 3);
        assert_eq!(effects, vec![Effect::UpdateWindow]);
    }

    #[test]
    fn set_viewport_no_change_returns_empty() {
        let mut state = test_state();
        let effects = state.apply(Command::SetViewport(Size::new(800.0, 600.0)));
        assert!(effects.is_empty());

        let effects = state.apply(Command::SetViewport(Size::new(1024.0, 768.0)));
        assert_eq!(effects, vec![Effect::ClampScroll, Effect::UpdateWindow]);
    }
}
