//! Per-frame shader parameters.

use glam::Vec2;
use tracing::debug;

use crate::bound::Bound;

/// Lowest iteration cap the kernel ever runs with.
pub const MIN_ITERATION_CAP: u32 = 200;

/// Iteration cap for the given view.
///
/// The cap grows by 50 iterations each time the diagonal of the view halves,
/// and never drops below [`MIN_ITERATION_CAP`]. Degenerate or non-finite
/// extents are clamped to the smallest positive length before the logarithm.
pub fn iteration_cap(bound: &Bound) -> u32 {
    let length = bound.extent().length();
    let length = if length.is_finite() {
        length.max(f32::MIN_POSITIVE)
    } else {
        f32::MAX
    };
    // Float to int casts saturate, negative values land on 0
    let cap = (-50.0 * length.log2()).floor() as u32;
    cap.max(MIN_ITERATION_CAP)
}

/// Everything the compute kernel needs for one frame, plus the diagnostic
/// toggles driven by the keyboard.
#[derive(Clone, Debug)]
pub struct ParameterState {
    /// Visible region of the complex plane
    pub bound: Bound,
    /// Julia constant, fixed at startup
    pub constant: Vec2,
    iteration_cap: u32,
    print_iteration_count: bool,
    print_fps: bool,
}

impl ParameterState {
    /// Create the initial state for the Julia constant `constant`.
    pub fn new(constant: Vec2) -> Self {
        Self {
            bound: Bound::default(),
            constant,
            iteration_cap: MIN_ITERATION_CAP,
            print_iteration_count: false,
            print_fps: false,
        }
    }

    /// Current iteration cap.
    pub fn iteration_cap(&self) -> u32 {
        self.iteration_cap
    }

    /// Recompute the iteration cap from the current bound.
    ///
    /// Returns the new value if it differs from the previous one.
    pub fn update_iteration_cap(&mut self) -> Option<u32> {
        let cap = iteration_cap(&self.bound);
        if cap == self.iteration_cap {
            return None;
        }
        debug!("Iteration cap {} -> {}", self.iteration_cap, cap);
        self.iteration_cap = cap;
        Some(cap)
    }

    pub fn print_iteration_count(&self) -> bool {
        self.print_iteration_count
    }

    pub fn print_fps(&self) -> bool {
        self.print_fps
    }

    /// Flip iteration-cap printing and return the new setting.
    pub fn toggle_print_iteration_count(&mut self) -> bool {
        self.print_iteration_count = !self.print_iteration_count;
        self.print_iteration_count
    }

    /// Flip FPS printing and return the new setting.
    pub fn toggle_print_fps(&mut self) -> bool {
        self.print_fps = !self.print_fps;
        self.print_fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound_with_extent(size: f32) -> Bound {
        Bound::new(Vec2::ZERO, Vec2::splat(size))
    }

    #[test]
    fn test_iteration_cap_floor() {
        // Default view: diagonal ~5.66, log2 positive, result clamps to 200
        assert_eq!(iteration_cap(&Bound::default()), MIN_ITERATION_CAP);
        assert_eq!(iteration_cap(&bound_with_extent(1.0)), MIN_ITERATION_CAP);
        assert_eq!(iteration_cap(&bound_with_extent(1000.0)), MIN_ITERATION_CAP);
    }

    #[test]
    fn test_iteration_cap_deep_zoom() {
        // Diagonal of 2^-5 gives exactly 250
        let side = 2.0_f32.powi(-5) / 2.0_f32.sqrt();
        let cap = iteration_cap(&bound_with_extent(side));
        assert!((249..=250).contains(&cap), "cap = {}", cap);
    }

    #[test]
    fn test_iteration_cap_monotonic() {
        let mut previous = 0;
        let mut size = 4.0_f32;
        while size > 1e-6 {
            let cap = iteration_cap(&bound_with_extent(size));
            assert!(cap >= previous, "cap dropped at size {}", size);
            previous = cap;
            size *= 0.5;
        }
        assert!(previous > MIN_ITERATION_CAP);
    }

    #[test]
    fn test_iteration_cap_degenerate_extent() {
        let zero = Bound::new(Vec2::ONE, Vec2::ONE);
        assert!(iteration_cap(&zero) > MIN_ITERATION_CAP);

        let nan = Bound::new(Vec2::ZERO, Vec2::splat(f32::NAN));
        assert_eq!(iteration_cap(&nan), MIN_ITERATION_CAP);
    }

    #[test]
    fn test_update_reports_changes_only() {
        let mut params = ParameterState::new(Vec2::new(-0.8, 0.156));
        assert_eq!(params.iteration_cap(), MIN_ITERATION_CAP);
        assert_eq!(params.update_iteration_cap(), None);

        params.bound = bound_with_extent(1e-3);
        let cap = params.update_iteration_cap();
        assert!(cap.is_some());
        assert_eq!(cap, Some(params.iteration_cap()));
        assert_eq!(params.update_iteration_cap(), None);
    }

    #[test]
    fn test_toggles() {
        let mut params = ParameterState::new(Vec2::ZERO);
        assert!(!params.print_fps());
        assert!(params.toggle_print_fps());
        assert!(!params.toggle_print_fps());

        assert!(!params.print_iteration_count());
        assert!(params.toggle_print_iteration_count());
        assert!(params.print_iteration_count());
    }
}
