//! Zoom and pan control
//!
//! Adjusts the scale factor and scroll offset stored in [`ViewState`],
//! keeping the document point under the cursor fixed while zooming.

use super::layout::PageLayout;
use super::state::ViewState;
use super::types::{Point, Size};

/// Zoom/pan controller with its clamping limits
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Zoom {
    /// Minimum allowed zoom factor
    pub min_scale: f32,
    /// Maximum allowed zoom factor
    pub max_scale: f32,
    /// Exponent per unit of scroll delta
    pub intensity: f32,
}

impl Default for Zoom {
    fn default() -> Self {
        Self {
            min_scale: Self::MIN_SCALE,
            max_scale: Self::MAX_SCALE,
            intensity: Self::INTENSITY,
        }
    }
}

impl Zoom {
    pub const MIN_SCALE: f32 = 0.1;
    pub const MAX_SCALE: f32 = 5.0;
    pub const INTENSITY: f32 = 0.02;

    #[must_use]
    pub fn new(min_scale: f32, max_scale: f32, intensity: f32) -> Self {
        let min_scale = if min_scale.is_finite() && min_scale > 0.0 {
            min_scale
        } else {
            Self::MIN_SCALE
        };
        Self {
            min_scale,
            max_scale: max_scale.max(min_scale),
            intensity,
        }
    }

    /// Clamp factor to valid range; NaN falls back to 1.0
    #[must_use]
    pub fn clamp_factor(&self, factor: f32) -> f32 {
        if factor.is_nan() {
            1.0_f32.clamp(self.min_scale, self.max_scale)
        } else {
            factor.clamp(self.min_scale, self.max_scale)
        }
    }

    /// Zoom by `exp(delta * intensity)` around `anchor` (viewport pixels).
    ///
    /// Returns true if the scale changed.
    pub fn on_scroll(
        &self,
        view: &mut ViewState,
        layout: &PageLayout,
        delta: f32,
        anchor: Point,
    ) -> bool {
        let old_scale = view.scale;
        let new_scale = self.clamp_factor(old_scale * (delta * self.intensity).exp());
        if (new_scale - old_scale).abs() <= f32::EPSILON {
            return false;
        }

        let content = Point::new(view.scroll.x + anchor.x, view.scroll.y + anchor.y);
        let pinned = layout.hit_test(content, old_scale).and_then(|(page, local)| {
            let before = layout.geometry(page, old_scale)?;
            let after = layout.geometry(page, new_scale)?;
            let doc_point = before.to_document(local);
            let local_after = after.to_screen(doc_point);
            let origin = layout.page_origin(page, new_scale);
            Some(Point::new(origin.x + local_after.x, origin.y + local_after.y))
        });

        // Anchor over a gap or margin: scale the content offset proportionally
        let target = pinned.unwrap_or_else(|| {
            let ratio = new_scale / old_scale;
            let gap = layout.gap();
            Point::new(
                gap + (content.x - gap) * ratio,
                gap + (content.y - gap) * ratio,
            )
        });

        view.scale = new_scale;
        view.scroll = Point::new(target.x - anchor.x, target.y - anchor.y);
        Self::clamp_scroll(view, layout);
        true
    }

    /// Pan by `delta` pixels. Returns true if the offset moved.
    pub fn on_pan(&self, view: &mut ViewState, layout: &PageLayout, delta: Point) -> bool {
        let before = view.scroll;
        view.scroll = Point::new(before.x + delta.x, before.y + delta.y);
        Self::clamp_scroll(view, layout);
        view.scroll != before
    }

    /// Keep the scroll offset inside the content so it never leaves the viewport
    pub fn clamp_scroll(view: &mut ViewState, layout: &PageLayout) {
        let content = layout.content_size(view.scale);
        let max = Size::new(
            (content.width - view.viewport.width).max(0.0),
            (content.height - view.viewport.height).max(0.0),
        );
        let clamp = |v: f32, hi: f32| if v.is_finite() { v.clamp(0.0, hi) } else { 0.0 };
        view.scroll = Point::new(clamp(view.scroll.x, max.width), clamp(view.scroll.y, max.height));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (ViewState, PageLayout) {
        let layout = PageLayout::new(vec![Size::new(100.0, 200.0); 5], 72.0, 10.0);
        let view = ViewState::new(5, 1.0, Size::new(120.0, 300.0));
        (view, layout)
    }

    #[test]
    fn scale_stays_within_limits() {
        let (mut view, layout) = setup();
        let zoom = Zoom::default();
        for _ in 0..500 {
            zoom.on_scroll(&mut view, &layout, 120.0, Point::new(50.0, 50.0));
            assert!(view.scale <= Zoom::MAX_SCALE);
        }
        assert_eq!(view.scale, Zoom::MAX_SCALE);
        for _ in 0..500 {
            zoom.on_scroll(&mut view, &layout, -120.0, Point::new(50.0, 50.0));
            assert!(view.scale >= Zoom::MIN_SCALE);
        }
        assert_eq!(view.scale, Zoom::MIN_SCALE);
    }

    #[test]
    fn at_limit_returns_false() {
        let (mut view, layout) = setup();
        let zoom = Zoom::default();
        view.scale = Zoom::MAX_SCALE;
        assert!(!zoom.on_scroll(&mut view, &layout, 10.0, Point::new(0.0, 0.0)));
    }

    #[test]
    fn anchor_point_stays_fixed() {
        let (mut view, layout) = setup();
        let zoom = Zoom::default();
        let anchor = Point::new(60.0, 150.0);

        let (page, local) = layout.hit_test(anchor, view.scale).expect("over page 0");
        let doc_before = layout.geometry(page, view.scale).unwrap().to_document(local);

        assert!(zoom.on_scroll(&mut view, &layout, 20.0, anchor));
        assert!(view.scale > 1.0);

        let content = Point::new(view.scroll.x + anchor.x, view.scroll.y + anchor.y);
        let (page_after, local_after) = layout.hit_test(content, view.scale).unwrap();
        assert_eq!(page_after, page);
        let doc_after = layout
            .geometry(page, view.scale)
            .unwrap()
            .to_document(local_after);
        assert!((doc_before.x - doc_after.x).abs() < 1e-2);
        assert!((doc_before.y - doc_after.y).abs() < 1e-2);
    }

    #[test]
    fn pan_clamps_over_scroll() {
        let (mut view, layout) = setup();
        let zoom = Zoom::default();
        zoom.on_pan(&mut view, &layout, Point::new(-50.0, -50.0));
        assert_eq!(view.scroll, Point::new(0.0, 0.0));

        zoom.on_pan(&mut view, &layout, Point::new(0.0, 1.0e9));
        let content = layout.content_size(view.scale);
        assert_eq!(view.scroll.y, content.height - view.viewport.height);
        // Content is exactly as wide as the viewport: no horizontal travel
        assert!(!zoom.on_pan(&mut view, &layout, Point::new(30.0, 0.0)));
    }

    #[test]
    fn nan_factor_is_sanitized() {
        let zoom = Zoom::default();
        assert_eq!(zoom.clamp_factor(f32::NAN), 1.0);
        assert_eq!(zoom.clamp_factor(f32::INFINITY), Zoom::MAX_SCALE);
        assert_eq!(zoom.clamp_factor(f32::NEG_INFINITY), Zoom::MIN_SCALE);
    }
}
