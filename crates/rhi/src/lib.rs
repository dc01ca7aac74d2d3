//! Vulkan abstraction layer (Render Hardware Interface).
//!
//! Safe wrappers over `ash` for what a compute-to-swapchain renderer needs:
//! - Instance, physical device and logical device creation
//! - Swapchain management with storage-image usage
//! - Command pools and command buffer recording
//! - Descriptor sets, compute pipelines and shader modules
//! - Image views and layout barriers
//! - Semaphores and fences

mod error;

pub mod command;
pub mod descriptor;
pub mod device;
pub mod image;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod shader;
pub mod swapchain;
pub mod sync;

pub use error::{RhiError, RhiResult};

pub use ash::vk;
