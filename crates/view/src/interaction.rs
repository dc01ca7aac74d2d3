//! Pointer interaction: pan gesture and scroll zoom.
//!
//! A pan is a three-state gesture:
//!
//! ```text
//!          press                 moved >= PAN_THRESHOLD
//!   Idle ---------> Pending ------------------------------> Active
//!    ^                 |                                       |
//!    +----- release ---+------------- release -----------------+
//! ```
//!
//! The `Pending` state swallows small jitters so that a click does not nudge
//! the view. Once `Active`, every move translates the bound by the cursor
//! delta expressed in complex-plane units.

use glam::Vec2;
use tracing::trace;

use crate::bound::Bound;

/// Cursor travel in pixels needed before a press becomes a drag.
pub const PAN_THRESHOLD: f32 = 2.0;

/// State of the pan gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum PanState {
    /// No button held.
    #[default]
    Idle,
    /// Button held, cursor has not yet moved far enough.
    Pending { initial_position: Vec2 },
    /// Dragging; `last_position` is the cursor at the previous move.
    Active { last_position: Vec2 },
}

impl PanState {
    pub fn new() -> Self {
        Self::Idle
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// A pointer button went down at `position`.
    pub fn on_press(&mut self, position: Vec2) {
        match *self {
            Self::Idle => *self = Self::Pending { initial_position: position },
            Self::Pending { .. } | Self::Active { .. } => {}
        }
    }

    /// The pointer button was released.
    pub fn on_release(&mut self) {
        match *self {
            Self::Idle => {}
            Self::Pending { .. } | Self::Active { .. } => *self = Self::Idle,
        }
    }

    /// The cursor moved to `position`.
    ///
    /// While dragging, `bound` is translated so the point under the cursor
    /// follows it. Nothing happens if `framebuffer` has a zero dimension.
    pub fn on_move(&mut self, position: Vec2, framebuffer: Vec2, bound: &mut Bound) {
        match *self {
            Self::Idle => {}
            Self::Pending { initial_position } => {
                if position.distance(initial_position) >= PAN_THRESHOLD {
                    trace!("Pan started at {:?}", position);
                    *self = Self::Active { last_position: position };
                }
            }
            Self::Active { last_position } => {
                if !has_area(framebuffer) {
                    return;
                }
                let offset = (position - last_position) / framebuffer * bound.extent();
                bound.pan(offset);
                *self = Self::Active { last_position: position };
            }
        }
    }
}

/// Zoom `bound` by `lines` scroll lines, anchored at the cursor.
///
/// Positive `lines` zoom out. The complex-plane point under `cursor` stays
/// under the cursor.
pub fn zoom(bound: &mut Bound, lines: f32, cursor: Vec2, framebuffer: Vec2) {
    if !has_area(framebuffer) {
        return;
    }
    let anchor = bound.lerp(cursor / framebuffer);
    bound.zoom_about(lines, anchor);
}

fn has_area(framebuffer: Vec2) -> bool {
    framebuffer.x > 0.0 && framebuffer.y > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAMEBUFFER: Vec2 = Vec2::new(512.0, 512.0);

    fn approx_eq_vec2(a: Vec2, b: Vec2) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    #[test]
    fn test_press_release_cycle() {
        let mut pan = PanState::new();
        pan.on_press(Vec2::new(10.0, 10.0));
        assert_eq!(
            pan,
            PanState::Pending {
                initial_position: Vec2::new(10.0, 10.0)
            }
        );

        pan.on_release();
        assert_eq!(pan, PanState::Idle);

        // Release while idle is ignored
        pan.on_release();
        assert_eq!(pan, PanState::Idle);
    }

    #[test]
    fn test_second_press_keeps_initial_position() {
        let mut pan = PanState::new();
        pan.on_press(Vec2::new(1.0, 1.0));
        pan.on_press(Vec2::new(50.0, 50.0));
        assert_eq!(
            pan,
            PanState::Pending {
                initial_position: Vec2::new(1.0, 1.0)
            }
        );
    }

    #[test]
    fn test_move_below_threshold_stays_pending() {
        let mut pan = PanState::new();
        let mut bound = Bound::default();
        pan.on_press(Vec2::new(100.0, 100.0));
        pan.on_move(Vec2::new(101.0, 101.0), FRAMEBUFFER, &mut bound);

        assert!(matches!(pan, PanState::Pending { .. }));
        assert_eq!(bound, Bound::default());
    }

    #[test]
    fn test_threshold_activates_without_panning() {
        let mut pan = PanState::new();
        let mut bound = Bound::default();
        pan.on_press(Vec2::new(100.0, 100.0));
        pan.on_move(Vec2::new(102.0, 100.0), FRAMEBUFFER, &mut bound);

        assert_eq!(
            pan,
            PanState::Active {
                last_position: Vec2::new(102.0, 100.0)
            }
        );
        assert_eq!(bound, Bound::default());
    }

    #[test]
    fn test_active_move_offsets_bound() {
        let mut pan = PanState::Active {
            last_position: Vec2::new(100.0, 100.0),
        };
        let mut bound = Bound::default();

        // 64 px of 512 is 1/8 of the 4.0 wide bound
        pan.on_move(Vec2::new(164.0, 100.0), FRAMEBUFFER, &mut bound);

        assert!(approx_eq_vec2(bound.min, Vec2::new(-2.5, -2.0)));
        assert!(approx_eq_vec2(bound.max, Vec2::new(1.5, 2.0)));
        assert_eq!(
            pan,
            PanState::Active {
                last_position: Vec2::new(164.0, 100.0)
            }
        );
    }

    #[test]
    fn test_idle_move_is_noop() {
        let mut pan = PanState::new();
        let mut bound = Bound::default();
        pan.on_move(Vec2::new(300.0, 300.0), FRAMEBUFFER, &mut bound);
        assert_eq!(pan, PanState::Idle);
        assert_eq!(bound, Bound::default());
    }

    #[test]
    fn test_active_move_with_zero_framebuffer() {
        let mut pan = PanState::Active {
            last_position: Vec2::ZERO,
        };
        let mut bound = Bound::default();
        pan.on_move(Vec2::new(10.0, 10.0), Vec2::new(0.0, 512.0), &mut bound);

        assert_eq!(bound, Bound::default());
        assert!(pan.is_active());
    }

    #[test]
    fn test_zoom_at_window_center() {
        let mut bound = Bound::default();
        zoom(&mut bound, 10.0, FRAMEBUFFER * 0.5, FRAMEBUFFER);

        assert!((bound.min.x + 2.2092).abs() < 1e-3);
        assert!((bound.max.y - 2.2092).abs() < 1e-3);
    }

    #[test]
    fn test_zoom_keeps_point_under_cursor() {
        let mut bound = Bound::default();
        let cursor = Vec2::new(128.0, 384.0);
        let before = bound.lerp(cursor / FRAMEBUFFER);

        zoom(&mut bound, -25.0, cursor, FRAMEBUFFER);

        assert!(approx_eq_vec2(bound.lerp(cursor / FRAMEBUFFER), before));
        assert!(bound.extent().x < 4.0);
    }
}
