//! Page-scoped redaction rectangles and the draw gesture that creates them

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::error::Result;
use super::geometry::PageGeometry;
use super::types::{Point, Rect};

/// Minimum drawn width and height, in screen pixels, for a rectangle to be kept
pub const MIN_REDACTION_SIZE: f32 = 5.0;

/// A committed redaction in document space
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Redaction {
    pub page: usize,
    pub rect: Rect,
}

/// What to do with a committed rectangle that leaves the page
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsPolicy {
    /// Trim to the page; discard if nothing is left
    #[default]
    Clamp,
    /// Discard any rectangle not fully on the page
    Reject,
    /// Store as drawn
    Ignore,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Gesture {
    Idle,
    Drawing {
        page: usize,
        anchor: Point,
        live: Rect,
    },
}

/// Why a gesture produced no redaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscardReason {
    NotDrawing,
    TooSmall,
    OutOfBounds,
}

/// Result of releasing a draw gesture
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawOutcome {
    Committed(Redaction),
    Discarded(DiscardReason),
}

/// Redactions keyed by page index, in append (undo) order
pub type RedactionMap = BTreeMap<usize, Vec<Redaction>>;

/// Owns every redaction of the open document plus the in-progress gesture
#[derive(Clone, Debug)]
pub struct RedactionStore {
    pages: RedactionMap,
    gesture: Gesture,
    min_size: f32,
    bounds: BoundsPolicy,
}

impl Default for RedactionStore {
    fn default() -> Self {
        Self::new(MIN_REDACTION_SIZE, BoundsPolicy::default())
    }
}

impl RedactionStore {
    #[must_use]
    pub fn new(min_size: f32, bounds: BoundsPolicy) -> Self {
        Self {
            pages: RedactionMap::new(),
            gesture: Gesture::Idle,
            min_size: min_size.max(0.0),
            bounds,
        }
    }

    /// Start drawing on `page` at a page-local screen point.
    /// An unfinished gesture is dropped.
    pub fn begin_draw(&mut self, page: usize, at: Point) {
        self.gesture = Gesture::Drawing {
            page,
            anchor: at,
            live: Rect::new(at.x, at.y, 0.0, 0.0),
        };
    }

    /// Track the pointer, returning the live screen rectangle
    pub fn update_draw(&mut self, at: Point) -> Option<Rect> {
        match &mut self.gesture {
            Gesture::Drawing { anchor, live, .. } => {
                *live = Rect::from_corners(*anchor, at);
                Some(*live)
            }
            Gesture::Idle => None,
        }
    }

    /// Page and live rectangle of the gesture in progress
    #[must_use]
    pub fn live(&self) -> Option<(usize, Rect)> {
        match self.gesture {
            Gesture::Drawing { page, live, .. } => Some((page, live)),
            Gesture::Idle => None,
        }
    }

    #[must_use]
    pub fn is_drawing(&self) -> bool {
        matches!(self.gesture, Gesture::Drawing { .. })
    }

    /// Abandon the gesture in progress without storing anything
    pub fn cancel_draw(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Release the gesture at `at`.
    ///
    /// `geometry` supplies the transform for the gesture's page. If it fails
    /// (the page has no raster) the gesture is dropped and the error returned.
    pub fn end_draw(
        &mut self,
        at: Point,
        geometry: impl FnOnce(usize) -> Result<PageGeometry>,
    ) -> Result<DrawOutcome> {
        let Gesture::Drawing { page, anchor, .. } = std::mem::replace(&mut self.gesture, Gesture::Idle)
        else {
            return Ok(DrawOutcome::Discarded(DiscardReason::NotDrawing));
        };

        let screen = Rect::from_corners(anchor, at);
        if screen.width < self.min_size || screen.height < self.min_size {
            debug!(
                "Discarding {}x{} redaction on page {page}",
                screen.width, screen.height
            );
            return Ok(DrawOutcome::Discarded(DiscardReason::TooSmall));
        }

        let geometry = geometry(page)?;
        let drawn = geometry.rect_to_document(&screen);
        let rect = match self.bounds {
            BoundsPolicy::Ignore => Some(drawn),
            BoundsPolicy::Reject => drawn.within(geometry.page_size).then_some(drawn),
            BoundsPolicy::Clamp => drawn.clamp_to(geometry.page_size),
        };
        let Some(rect) = rect else {
            return Ok(DrawOutcome::Discarded(DiscardReason::OutOfBounds));
        };

        let redaction = Redaction { page, rect };
        self.pages.entry(page).or_default().push(redaction);
        debug!("Committed redaction on page {page}: {rect:?}");
        Ok(DrawOutcome::Committed(redaction))
    }

    /// Remove the most recent redaction on `page`
    pub fn undo_last(&mut self, page: usize) -> Option<Redaction> {
        let list = self.pages.get_mut(&page)?;
        let removed = list.pop();
        if list.is_empty() {
            self.pages.remove(&page);
        }
        removed
    }

    pub fn clear_all(&mut self) {
        self.pages.clear();
        self.gesture = Gesture::Idle;
    }

    /// Redactions of one page, oldest first
    #[must_use]
    pub fn redactions(&self, page: usize) -> &[Redaction] {
        self.pages.get(&page).map_or(&[], Vec::as_slice)
    }

    /// Full `page -> rectangles` map handed to the save step
    #[must_use]
    pub fn all(&self) -> &RedactionMap {
        &self.pages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Add an already document-space redaction, e.g. restored from a sidecar
    pub fn insert(&mut self, redaction: Redaction) {
        self.pages.entry(redaction.page).or_default().push(redaction);
    }
}
