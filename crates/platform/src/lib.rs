//! Platform layer for the fractal explorer.
//!
//! - Window management and Vulkan surface creation via winit and ash-window
//! - Translation of window events into explorer input

mod input;
mod window;

pub use input::{InputEvent, InputTranslator, KeyCode, PIXELS_PER_LINE, scroll_lines};
pub use window::{Surface, Window};

pub use winit::event::WindowEvent;
pub use winit::event_loop::{ActiveEventLoop, EventLoop};
