//! Translation of winit window events into explorer input events.
//!
//! Cursor coordinates are kept in physical pixels so that they line up with
//! the framebuffer size used to normalize them.

use glam::Vec2;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::PhysicalKey;

pub use winit::keyboard::KeyCode;

/// Pixels per scroll line for devices that report pixel deltas (touchpads).
pub const PIXELS_PER_LINE: f32 = 20.0;

/// Input the explorer reacts to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A mouse button went down at the given cursor position.
    Press(Vec2),
    /// A mouse button was released.
    Release,
    /// The cursor moved to the given position.
    Move(Vec2),
    /// Vertical scroll in lines, positive away from the user, at the given cursor position.
    Scroll { lines: f32, cursor: Vec2 },
    /// A key was pressed (auto-repeat excluded).
    Key(KeyCode),
}

/// Stateful translator that remembers the last cursor position.
#[derive(Debug, Default)]
pub struct InputTranslator {
    cursor: Vec2,
}

impl InputTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known cursor position in physical pixels.
    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    /// Converts a window event, or returns `None` for events the explorer ignores.
    pub fn translate(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                Some(InputEvent::Move(self.cursor))
            }
            WindowEvent::MouseInput { state, .. } => Some(match state {
                ElementState::Pressed => InputEvent::Press(self.cursor),
                ElementState::Released => InputEvent::Release,
            }),
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = scroll_lines(*delta);
                (lines != 0.0).then_some(InputEvent::Scroll {
                    lines,
                    cursor: self.cursor,
                })
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                match event.physical_key {
                    PhysicalKey::Code(code) => Some(InputEvent::Key(code)),
                    PhysicalKey::Unidentified(_) => None,
                }
            }
            _ => None,
        }
    }
}

/// Vertical scroll amount in lines.
pub fn scroll_lines(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;
    use winit::event::{DeviceId, MouseButton, TouchPhase};

    fn device_id() -> DeviceId {
        // SAFETY: only used as an opaque value in tests.
        unsafe { DeviceId::dummy() }
    }

    #[test]
    fn test_scroll_lines() {
        assert_eq!(scroll_lines(MouseScrollDelta::LineDelta(0.0, 3.0)), 3.0);
        assert_eq!(
            scroll_lines(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -40.0))),
            -2.0
        );
    }

    #[test]
    fn test_press_uses_last_cursor_position() {
        let mut translator = InputTranslator::new();

        let moved = translator.translate(&WindowEvent::CursorMoved {
            device_id: device_id(),
            position: PhysicalPosition::new(10.0, 20.0),
        });
        assert_eq!(moved, Some(InputEvent::Move(Vec2::new(10.0, 20.0))));

        let pressed = translator.translate(&WindowEvent::MouseInput {
            device_id: device_id(),
            state: ElementState::Pressed,
            button: MouseButton::Left,
        });
        assert_eq!(pressed, Some(InputEvent::Press(Vec2::new(10.0, 20.0))));

        let released = translator.translate(&WindowEvent::MouseInput {
            device_id: device_id(),
            state: ElementState::Released,
            button: MouseButton::Left,
        });
        assert_eq!(released, Some(InputEvent::Release));
    }

    #[test]
    fn test_scroll_event_carries_cursor() {
        let mut translator = InputTranslator::new();
        translator.translate(&WindowEvent::CursorMoved {
            device_id: device_id(),
            position: PhysicalPosition::new(256.0, 128.0),
        });

        let scrolled = translator.translate(&WindowEvent::MouseWheel {
            device_id: device_id(),
            delta: MouseScrollDelta::LineDelta(0.0, -1.0),
            phase: TouchPhase::Moved,
        });
        assert_eq!(
            scrolled,
            Some(InputEvent::Scroll {
                lines: -1.0,
                cursor: Vec2::new(256.0, 128.0),
            })
        );
    }

    #[test]
    fn test_horizontal_only_scroll_is_ignored() {
        let mut translator = InputTranslator::new();
        let scrolled = translator.translate(&WindowEvent::MouseWheel {
            device_id: device_id(),
            delta: MouseScrollDelta::LineDelta(2.0, 0.0),
            phase: TouchPhase::Moved,
        });
        assert_eq!(scrolled, None);
    }

    #[test]
    fn test_unrelated_events_are_ignored() {
        let mut translator = InputTranslator::new();
        assert_eq!(translator.translate(&WindowEvent::Focused(true)), None);
    }
}
