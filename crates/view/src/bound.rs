//! Visible region of the complex plane.
//!
//! This module provides the [`Bound`] struct, an axis-aligned rectangle
//! described by its `min` and `max` corners. Every view operation (pan,
//! zoom, aspect alignment) is an affine update of both corners, so the
//! rectangle never flips as long as the scale factors stay positive.
//!
//! An update is dropped when its result would leave `f32` range or shrink
//! the rectangle below [`MIN_RELATIVE_EXTENT`] of its corner magnitude. Past
//! that point the corners stop moving under a 1% zoom step and the view
//! could never zoom back out.
//!
//! # Example
//!
//! ```
//! use fractal_view::Bound;
//! use glam::Vec2;
//!
//! let mut bound = Bound::default();
//!
//! // Zoom out by ten scroll lines around the center
//! bound.zoom_about(10.0, bound.center());
//! assert!(bound.max.x > 2.2 && bound.max.x < 2.21);
//!
//! // Shift the view a quarter of the width to the left
//! bound.pan(Vec2::new(bound.extent().x * 0.25, 0.0));
//! ```

use glam::Vec2;

/// Zoom factor applied per scroll line.
pub const ZOOM_BASE: f32 = 1.01;

/// Smallest allowed extent as a fraction of the largest corner magnitude on
/// the same axis. A 1% step at this size still moves a corner by several ulps.
pub const MIN_RELATIVE_EXTENT: f32 = 1024.0 * f32::EPSILON;

/// An axis-aligned rectangle in the complex plane.
///
/// Invariant: `max.x > min.x` and `max.y > min.y`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bound {
    /// Lower-left corner
    pub min: Vec2,
    /// Upper-right corner
    pub max: Vec2,
}

impl Default for Bound {
    fn default() -> Self {
        Self {
            min: Vec2::splat(-2.0),
            max: Vec2::splat(2.0),
        }
    }
}

impl Bound {
    /// Create a bound from its two corners.
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Width and height of the rectangle.
    pub fn extent(&self) -> Vec2 {
        self.max - self.min
    }

    /// Midpoint of the rectangle.
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Map a normalized position (`0..1` on both axes) into the rectangle.
    pub fn lerp(&self, t: Vec2) -> Vec2 {
        self.min + (self.max - self.min) * t
    }

    /// Translate the rectangle by `-offset`.
    ///
    /// Dragging the cursor to the right moves the picture to the right, which
    /// means the visible region moves left.
    pub fn pan(&mut self, offset: Vec2) {
        self.try_set(self.min - offset, self.max - offset);
    }

    /// Scale the rectangle about `anchor` by `1.01^lines`.
    ///
    /// The anchor keeps its position relative to the rectangle, so the point
    /// under the cursor stays under the cursor. Returns `false` if the zoom
    /// was dropped because it would overflow or exhaust `f32` precision.
    pub fn zoom_about(&mut self, lines: f32, anchor: Vec2) -> bool {
        let scale = Vec2::splat(ZOOM_BASE.powf(lines));
        self.scale_about(scale, anchor)
    }

    /// Whether the rectangle satisfies its invariant with usable precision.
    pub fn is_valid(&self) -> bool {
        Self::accepts(self.min, self.max)
    }

    /// Re-align the horizontal extent to `aspect` (width / height).
    ///
    /// The center and the vertical extent are preserved.
    pub fn align_aspect(&mut self, aspect: f32) {
        let half = self.extent() * 0.5;
        if !(aspect.is_finite() && aspect > 0.0 && half.x > 0.0) {
            return;
        }
        let scale = Vec2::new(aspect * half.y / half.x, 1.0);
        self.scale_about(scale, self.center());
    }

    fn scale_about(&mut self, scale: Vec2, anchor: Vec2) -> bool {
        self.try_set(
            (self.min - anchor) * scale + anchor,
            (self.max - anchor) * scale + anchor,
        )
    }

    fn try_set(&mut self, min: Vec2, max: Vec2) -> bool {
        if !Self::accepts(min, max) {
            return false;
        }
        self.min = min;
        self.max = max;
        true
    }

    fn accepts(min: Vec2, max: Vec2) -> bool {
        let extent = max - min;
        if !(min.is_finite() && max.is_finite() && extent.is_finite()) {
            return false;
        }
        let magnitude = min
            .abs()
            .max(max.abs())
            .max(Vec2::splat(f32::MIN_POSITIVE));
        extent.cmpgt(magnitude * MIN_RELATIVE_EXTENT).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx_eq_vec2(a: Vec2, b: Vec2) -> bool {
        (a - b).abs().max_element() < EPSILON
    }

    #[test]
    fn test_default_bound() {
        let bound = Bound::default();
        assert_eq!(bound.min, Vec2::splat(-2.0));
        assert_eq!(bound.max, Vec2::splat(2.0));
        assert_eq!(bound.extent(), Vec2::splat(4.0));
        assert_eq!(bound.center(), Vec2::ZERO);
    }

    #[test]
    fn test_pan_moves_both_corners() {
        let mut bound = Bound::default();
        bound.pan(Vec2::new(0.5, -1.0));

        assert!(approx_eq_vec2(bound.min, Vec2::new(-2.5, -1.0)));
        assert!(approx_eq_vec2(bound.max, Vec2::new(1.5, 3.0)));
        assert_eq!(bound.extent(), Vec2::splat(4.0));
    }

    #[test]
    fn test_zoom_out_about_center() {
        let mut bound = Bound::default();
        bound.zoom_about(10.0, bound.center());

        let expected = 2.0 * 1.01_f32.powi(10);
        assert!(approx_eq_vec2(bound.min, Vec2::splat(-expected)));
        assert!(approx_eq_vec2(bound.max, Vec2::splat(expected)));
        assert!((bound.max.x - 2.2092).abs() < 1e-3);
    }

    #[test]
    fn test_zoom_preserves_anchor_fraction() {
        let mut bound = Bound::new(Vec2::new(-1.0, 0.0), Vec2::new(3.0, 2.0));
        let t = Vec2::new(0.25, 0.75);
        let anchor = bound.lerp(t);

        bound.zoom_about(-37.0, anchor);

        // The anchor sits at the same normalized position afterwards
        assert!(approx_eq_vec2(bound.lerp(t), anchor));
        assert!(bound.extent().x < 4.0);
    }

    #[test]
    fn test_zoom_zero_lines_is_identity() {
        let mut bound = Bound::default();
        bound.zoom_about(0.0, Vec2::new(1.0, 1.0));
        assert!(approx_eq_vec2(bound.min, Vec2::splat(-2.0)));
        assert!(approx_eq_vec2(bound.max, Vec2::splat(2.0)));
    }

    #[test]
    fn test_align_aspect_wide_window() {
        let mut bound = Bound::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0));
        bound.align_aspect(2.0);

        assert!(approx_eq_vec2(bound.center(), Vec2::new(1.0, 1.0)));
        assert!(approx_eq_vec2(bound.extent(), Vec2::new(4.0, 2.0)));
    }

    #[test]
    fn test_zoom_out_stops_before_overflow() {
        let mut bound = Bound::default();
        let anchor = bound.lerp(Vec2::new(0.5, 0.125));

        for _ in 0..10_000 {
            bound.zoom_about(1.0, anchor);
        }
        assert!(bound.is_valid());
        assert!(bound.extent().x > 1e30);

        // Zooming back in still works
        let before = bound.extent();
        assert!(bound.zoom_about(-100.0, anchor));
        assert!(bound.is_valid());
        assert!(bound.extent().x < before.x);
    }

    #[test]
    fn test_zoom_in_stops_while_zoom_out_still_moves() {
        let mut bound = Bound::default();
        let anchor = bound.lerp(Vec2::new(0.5, 0.75));

        for _ in 0..4_000 {
            bound.zoom_about(-1.0, anchor);
        }
        assert!(bound.is_valid());
        let deepest = bound.extent();
        assert!(!bound.zoom_about(-1.0, anchor));
        assert_eq!(bound.extent(), deepest);

        for _ in 0..10 {
            assert!(bound.zoom_about(1.0, anchor));
        }
        assert!(bound.extent().x > deepest.x);
        assert!(bound.extent().y > deepest.y);
    }

    #[test]
    fn test_zoom_rejects_non_finite_scale() {
        let mut bound = Bound::default();
        assert!(!bound.zoom_about(f32::INFINITY, Vec2::ZERO));
        assert!(!bound.zoom_about(f32::NAN, Vec2::ZERO));
        assert_eq!(bound, Bound::default());
    }

    #[test]
    fn test_align_aspect_rejects_degenerate() {
        let mut bound = Bound::default();
        bound.align_aspect(0.0);
        bound.align_aspect(f32::NAN);
        assert_eq!(bound, Bound::default());
    }
}
