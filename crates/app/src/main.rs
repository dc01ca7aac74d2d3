//! Interactive Julia set explorer - Main Entry Point
//!
//! Renders the Julia set for a constant given on the command line with a
//! Vulkan compute shader, recomputed every frame while the user pans and
//! zooms.

use anyhow::{Result, anyhow};
use clap::Parser;
use glam::Vec2;
use tracing::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use fractal_core::{Config, FrameTimer};
use fractal_platform::{InputEvent, InputTranslator, KeyCode, Window};
use fractal_renderer::{FrameBackend, FrameLoop, Renderer};
use fractal_view::{PanState, ParameterState, zoom};

const USAGE: &str = "[Usage]\n\
    - Press F to toggle printing the FPS.\n\
    - Press I to toggle printing the max iteration count.\n\
    - Press R to align the aspect ratio of the bound to the window's aspect ratio.\n\
    - Pan with the mouse to move the bound.\n\
    - Scroll to zoom in/out.";

#[derive(Parser, Debug)]
#[command(name = "fractal-explorer")]
#[command(about = "Interactive Julia set explorer")]
struct Args {
    /// Real part of c
    #[arg(value_name = "REAL", allow_negative_numbers = true)]
    real: f32,

    /// Imaginary part of c
    #[arg(value_name = "IMAG", allow_negative_numbers = true)]
    imag: f32,
}

struct App {
    config: Config,
    // The renderer drops before the window its surface belongs to
    frame_loop: Option<FrameLoop<Renderer>>,
    window: Option<Window>,
    params: ParameterState,
    pan: PanState,
    input: InputTranslator,
    timer: FrameTimer,
    failure: Option<String>,
}

impl App {
    fn new(constant: Vec2, config: Config) -> Self {
        Self {
            config,
            frame_loop: None,
            window: None,
            params: ParameterState::new(constant),
            pan: PanState::new(),
            input: InputTranslator::new(),
            timer: FrameTimer::new(),
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, message: String) {
        error!("{}", message);
        self.failure = Some(message);
        event_loop.exit();
    }

    fn handle_input(&mut self, input: InputEvent) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        let framebuffer = window.framebuffer_extent();

        match input {
            InputEvent::Press(position) => self.pan.on_press(position),
            InputEvent::Release => self.pan.on_release(),
            InputEvent::Move(position) => {
                self.pan
                    .on_move(position, framebuffer, &mut self.params.bound)
            }
            InputEvent::Scroll { lines, cursor } => {
                zoom(&mut self.params.bound, lines, cursor, framebuffer)
            }
            InputEvent::Key(KeyCode::KeyR) => {
                if let Some(aspect) = window.aspect_ratio() {
                    self.params.bound.align_aspect(aspect);
                    println!("Bound aspect ratio aligned to the window's aspect ratio");
                }
            }
            InputEvent::Key(KeyCode::KeyI) => {
                let on = self.params.toggle_print_iteration_count();
                println!("printIterationCount: {}", on_off(on));
            }
            InputEvent::Key(KeyCode::KeyF) => {
                let on = self.params.toggle_print_fps();
                println!("printFps: {}", on_off(on));
            }
            InputEvent::Key(_) => {}
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let delta = self.timer.delta_secs();

        let (Some(window), Some(frame_loop)) = (self.window.as_ref(), self.frame_loop.as_mut())
        else {
            return;
        };

        match frame_loop.render_frame(&mut self.params, window.framebuffer_size(), delta) {
            Ok(report) => {
                if let Some(cap) = report.iteration_cap {
                    println!("Max iteration: {}", cap);
                }
                if let Some(fps) = report.fps {
                    println!("FPS: {}", fps);
                }
            }
            Err(e) => self.fail(event_loop, format!("Render error: {}", e)),
        }
    }
}

/// Idles the device before teardown. A failure is fatal and returned as the
/// exit message.
fn shut_down<B: FrameBackend>(frame_loop: &mut FrameLoop<B>) -> Option<String> {
    frame_loop
        .shutdown()
        .err()
        .map(|e| format!("Failed to wait for device idle on exit: {}", e))
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match Window::new(
            event_loop,
            self.config.width,
            self.config.height,
            &self.config.title,
        ) {
            Ok(window) => window,
            Err(e) => return self.fail(event_loop, format!("Failed to create window: {}", e)),
        };

        match Renderer::new(&window, &self.config) {
            Ok(renderer) => {
                info!("Initialization complete, entering main loop");
                self.frame_loop = Some(FrameLoop::new(renderer));
                self.window = Some(window);
                self.timer.reset();
            }
            Err(e) => self.fail(event_loop, format!("Failed to create renderer: {}", e)),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                debug!("Window resized to {}x{}", size.width, size.height);
                if let Some(frame_loop) = self.frame_loop.as_mut() {
                    frame_loop.request_recovery();
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            other => {
                if let Some(input) = self.input.translate(&other) {
                    self.handle_input(input);
                }
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        // Nothing can be presented to a zero-sized surface; sleep until the
        // next event (the restoring resize) instead of spinning.
        if window.is_minimized() {
            event_loop.set_control_flow(ControlFlow::Wait);
        } else {
            event_loop.set_control_flow(ControlFlow::Poll);
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(message) = self.frame_loop.as_mut().and_then(shut_down) {
            error!("{}", message);
            self.failure.get_or_insert(message);
        }
        self.frame_loop = None;
        self.window = None;
    }
}

fn main() -> Result<()> {
    // Argument errors are reported before anything touches the GPU
    let args = Args::parse();

    fractal_core::init_logging();
    info!("Starting fractal explorer with c = ({}, {})", args.real, args.imag);

    let config = Config::from_env()?;
    debug!("{:?}", config);

    println!("{}", USAGE);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(Vec2::new(args.real, args.imag), config);
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(message) => Err(anyhow!(message)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use fractal_renderer::FractalPushConstants;
    use fractal_rhi::{RhiError, RhiResult};

    /// Backend whose only interesting behavior is the idle wait.
    struct IdleBackend {
        idle_fails: bool,
    }

    impl FrameBackend for IdleBackend {
        fn wait_for_slot(&mut self, _slot: usize) -> RhiResult<()> {
            Ok(())
        }

        fn acquire(&mut self, _slot: usize) -> RhiResult<Option<u32>> {
            Ok(Some(0))
        }

        fn reset_slot(&mut self, _slot: usize) -> RhiResult<()> {
            Ok(())
        }

        fn record_and_submit(
            &mut self,
            _slot: usize,
            _image_index: u32,
            _push_constants: &FractalPushConstants,
        ) -> RhiResult<()> {
            Ok(())
        }

        fn present(&mut self, _slot: usize, _image_index: u32) -> RhiResult<bool> {
            Ok(false)
        }

        fn wait_idle(&mut self) -> RhiResult<()> {
            if self.idle_fails {
                return Err(RhiError::FenceTimeout(u64::MAX));
            }
            Ok(())
        }

        fn recreate_swapchain(&mut self, _width: u32, _height: u32) -> RhiResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_shut_down_clean() {
        let mut frame_loop = FrameLoop::new(IdleBackend { idle_fails: false });
        assert_eq!(shut_down(&mut frame_loop), None);
    }

    #[test]
    fn test_shut_down_idle_failure_is_fatal() {
        let mut frame_loop = FrameLoop::new(IdleBackend { idle_fails: true });
        let message = shut_down(&mut frame_loop).unwrap();
        assert!(message.contains("device idle"));
    }

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parses_two_numbers() {
        let args = Args::try_parse_from(["fractal-explorer", "-0.8", "0.156"]).unwrap();
        assert_eq!(args.real, -0.8);
        assert_eq!(args.imag, 0.156);
    }

    #[test]
    fn test_rejects_wrong_argument_count() {
        assert!(Args::try_parse_from(["fractal-explorer"]).is_err());
        assert!(Args::try_parse_from(["fractal-explorer", "0.3"]).is_err());
        assert!(Args::try_parse_from(["fractal-explorer", "0.3", "0.5", "0.7"]).is_err());
    }

    #[test]
    fn test_rejects_non_numeric() {
        assert!(Args::try_parse_from(["fractal-explorer", "abc", "0.5"]).is_err());
    }

    #[test]
    fn test_usage_lists_every_key() {
        for key in ["Press F", "Press I", "Press R", "Pan", "Scroll"] {
            assert!(USAGE.contains(key), "missing {}", key);
        }
    }
}
