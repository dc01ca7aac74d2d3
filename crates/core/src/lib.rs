//! Core utilities for the fractal explorer.
//!
//! This crate provides foundational types used across the workspace:
//! - Error types and result aliases
//! - Logging initialization
//! - Frame timing
//! - Runtime configuration

mod config;
mod error;
mod logging;
mod timer;

pub use config::{
    Config, DEFAULT_HEIGHT, DEFAULT_SHADER_PATH, DEFAULT_TITLE, DEFAULT_WIDTH,
    PresentModePreference,
};
pub use error::{Error, Result};
pub use logging::{DEFAULT_FILTER, init_logging};
pub use timer::FrameTimer;
