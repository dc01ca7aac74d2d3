//! View state for the fractal explorer.
//!
//! This crate owns everything the user can change while exploring:
//! - The visible region of the complex plane ([`Bound`])
//! - The per-frame shader parameters ([`ParameterState`])
//! - The pan gesture state machine ([`PanState`])
//!
//! Nothing here touches the GPU, so the whole crate is testable on its own.

pub mod bound;
pub mod interaction;
pub mod params;

pub use bound::Bound;
pub use interaction::{PAN_THRESHOLD, PanState, zoom};
pub use params::{MIN_ITERATION_CAP, ParameterState, iteration_cap};
