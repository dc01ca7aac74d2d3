//! Compute-to-swapchain rendering for the fractal explorer.
//!
//! This crate orchestrates the rendering process:
//! - Per-slot frame resources ([`FrameResources`])
//! - Per-swapchain-image attachments ([`AttachmentSet`])
//! - Command encoding for the fractal kernel ([`FractalPass`])
//! - The frame loop and resize recovery ([`FrameLoop`])
//! - The Vulkan backend tying it together ([`Renderer`])

pub mod attachment;
pub mod diagnostics;
pub mod fractal_pass;
pub mod frame_loop;
pub mod frame_resources;
pub mod renderer;

pub use attachment::{Attachment, AttachmentSet};
pub use diagnostics::{FPS_WINDOW, FpsCounter};
pub use fractal_pass::{FractalPass, FractalPushConstants, WORKGROUP_SIZE, dispatch_group_count};
pub use frame_loop::{
    FrameBackend, FrameLoop, FrameOutcome, FrameReport, RecoveryStep, ResizeRecovery,
};
pub use frame_resources::{FrameResources, FrameSlot};
pub use renderer::Renderer;

pub use fractal_rhi::sync::MAX_FRAMES_IN_FLIGHT;
