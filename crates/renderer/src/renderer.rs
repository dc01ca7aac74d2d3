//! Vulkan backend for the frame loop.
//!
//! This module provides the [`Renderer`] struct that owns every Vulkan
//! object the explorer uses and implements [`FrameBackend`] on top of them.

use std::mem::ManuallyDrop;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, error, info};

use fractal_core::{Config, Result};
use fractal_platform::{Surface, Window};
use fractal_rhi::RhiResult;
use fractal_rhi::device::Device;
use fractal_rhi::instance::Instance;
use fractal_rhi::physical_device::select_physical_device;
use fractal_rhi::swapchain::Swapchain;

use crate::attachment::AttachmentSet;
use crate::fractal_pass::{ACQUIRE_WAIT_STAGE, FractalPass, FractalPushConstants};
use crate::frame_loop::FrameBackend;
use crate::frame_resources::FrameResources;

/// Owns the Vulkan objects and renders the fractal into the swapchain.
///
/// # Resource Destruction Order
///
/// Dropping waits for the device to go idle, then releases resources in
/// reverse dependency order:
/// 1. Frame resources (command buffers, descriptor sets, sync objects)
/// 2. Attachments (swapchain image views)
/// 3. Fractal pass (pipeline, layouts)
/// 4. Swapchain
/// 5. Logical device
/// 6. Surface
/// 7. Instance
pub struct Renderer {
    frames: ManuallyDrop<FrameResources>,
    attachments: ManuallyDrop<AttachmentSet>,
    pass: ManuallyDrop<FractalPass>,
    swapchain: ManuallyDrop<Swapchain>,
    device: ManuallyDrop<Arc<Device>>,
    surface: ManuallyDrop<Surface>,
    instance: ManuallyDrop<Instance>,
}

impl Renderer {
    /// Creates the renderer for `window`.
    ///
    /// # Errors
    ///
    /// Returns an error if Vulkan cannot be initialized, no GPU supports
    /// compute-to-swapchain rendering, or the compute shader fails to load.
    pub fn new(window: &Window, config: &Config) -> Result<Self> {
        let (width, height) = window.framebuffer_size();
        info!("Initializing Vulkan renderer ({}x{})", width, height);

        let instance = Instance::new(config.enable_validation, window.required_extensions()?)?;

        let surface = window.create_surface(instance.entry(), instance.handle())?;

        let physical_device_info =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;

        let device = Device::new(&instance, &physical_device_info)?;

        let swapchain = Swapchain::new(
            &instance,
            device.clone(),
            surface.handle(),
            width,
            height,
            config.present_mode,
        )?;

        let pass = FractalPass::new(device.clone(), &config.shader_path)?;
        let attachments = AttachmentSet::new(device.clone(), &swapchain)?;
        let frames = FrameResources::new(device.clone(), pass.set_layout())?;

        info!(
            "Renderer ready: {:?} {:?}, {} swapchain image(s)",
            swapchain.format(),
            swapchain.present_mode(),
            attachments.len()
        );

        Ok(Self {
            frames: ManuallyDrop::new(frames),
            attachments: ManuallyDrop::new(attachments),
            pass: ManuallyDrop::new(pass),
            swapchain: ManuallyDrop::new(swapchain),
            device: ManuallyDrop::new(device),
            surface: ManuallyDrop::new(surface),
            instance: ManuallyDrop::new(instance),
        })
    }

    /// Current swapchain extent.
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    pub fn format(&self) -> vk::Format {
        self.swapchain.format()
    }
}

impl FrameBackend for Renderer {
    fn wait_for_slot(&mut self, slot: usize) -> RhiResult<()> {
        self.frames.slot(slot).sync().in_flight().wait(u64::MAX)
    }

    fn acquire(&mut self, slot: usize) -> RhiResult<Option<u32>> {
        let semaphore = self.frames.slot(slot).sync().image_available().handle();
        self.swapchain.acquire_next_image(semaphore)
    }

    fn reset_slot(&mut self, slot: usize) -> RhiResult<()> {
        self.frames.slot(slot).sync().in_flight().reset()
    }

    fn record_and_submit(
        &mut self,
        slot: usize,
        image_index: u32,
        push_constants: &FractalPushConstants,
    ) -> RhiResult<()> {
        let frame = self.frames.slot(slot);
        let target = self.attachments.get(image_index)?;
        let cmd = frame.command_buffer();

        cmd.reset()?;
        cmd.begin()?;
        self.pass
            .encode(cmd, frame.descriptor_set(), target, push_constants);
        cmd.end()?;

        let wait_semaphores = [frame.sync().image_available().handle()];
        let wait_stages = [ACQUIRE_WAIT_STAGE];
        let signal_semaphores = [frame.sync().compute_finished().handle()];
        let command_buffers = [cmd.handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        // SAFETY: the command buffer was fully recorded above, the slot's fence
        // was reset by the frame loop and the acquire semaphore was signaled by
        // this slot's acquire.
        unsafe {
            self.device
                .submit_compute(&[submit_info], frame.sync().in_flight().handle())?;
        }

        Ok(())
    }

    fn present(&mut self, slot: usize, image_index: u32) -> RhiResult<bool> {
        let wait_semaphore = self.frames.slot(slot).sync().compute_finished().handle();
        self.swapchain
            .present(self.device.present_queue(), image_index, wait_semaphore)
    }

    fn wait_idle(&mut self) -> RhiResult<()> {
        self.device.wait_idle()
    }

    fn recreate_swapchain(&mut self, width: u32, height: u32) -> RhiResult<()> {
        // Views go before the images they point at
        self.attachments.clear();
        self.swapchain
            .recreate(&self.instance, self.surface.handle(), width, height)?;
        self.attachments.rebuild(&self.swapchain)?;

        debug!(
            "Rebuilt {} attachment(s) after swapchain recreation",
            self.attachments.len()
        );
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Wait for all GPU work to complete before destroying resources
        if let Err(e) = self.device.wait_idle() {
            error!(
                "Failed to wait for device idle during renderer drop: {:?}",
                e
            );
        }

        // SAFETY: each field is dropped exactly once, here, and never used
        // afterwards.
        unsafe {
            ManuallyDrop::drop(&mut self.frames);
            ManuallyDrop::drop(&mut self.attachments);
            ManuallyDrop::drop(&mut self.pass);
            ManuallyDrop::drop(&mut self.swapchain);
            ManuallyDrop::drop(&mut self.device);
            ManuallyDrop::drop(&mut self.surface);
            ManuallyDrop::drop(&mut self.instance);
        }

        info!("Renderer destroyed");
    }
}
