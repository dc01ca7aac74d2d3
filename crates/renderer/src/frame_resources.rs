//! Per-slot resources for frames in flight.
//!
//! This module provides [`FrameResources`], a fixed set of
//! [`MAX_FRAMES_IN_FLIGHT`] slots. Each slot owns everything one in-flight
//! frame needs:
//!
//! - A command buffer from a resettable pool on the compute queue family
//! - A descriptor set for the kernel's storage image
//! - An acquire semaphore, a finish semaphore and a completion fence
//!
//! # Overview
//!
//! While the GPU executes the frame recorded into slot `s`, the CPU records
//! the next frame into slot `s + 1`. A slot is only touched again after its
//! fence has been waited on, which guarantees its command buffer and
//! descriptor set are no longer in use.
//!
//! Slots are created once and never resized. Swapchain recreation leaves them
//! alone since nothing in a slot depends on the swapchain images; the
//! descriptor set is rewritten every frame anyway.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use fractal_rhi::device::Device;
//! use fractal_rhi::vk;
//! use fractal_renderer::frame_resources::FrameResources;
//!
//! # fn example(device: Arc<Device>, set_layout: vk::DescriptorSetLayout) -> Result<(), fractal_rhi::RhiError> {
//! let frames = FrameResources::new(device, set_layout)?;
//!
//! let slot = frames.slot(0);
//! slot.sync().in_flight().wait(u64::MAX)?;
//! slot.command_buffer().reset()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use fractal_rhi::RhiResult;
use fractal_rhi::command::{CommandBuffer, CommandPool};
use fractal_rhi::descriptor::{DescriptorPool, pool_size};
use fractal_rhi::device::Device;
use fractal_rhi::sync::{FrameSync, MAX_FRAMES_IN_FLIGHT};

/// Resources owned by one frame slot.
///
/// # Synchronization Flow
///
/// ```text
/// 1. Wait on in_flight (previous submission from this slot retired)
/// 2. Acquire swapchain image (signals image_available)
/// 3. Reset in_flight
/// 4. Record command_buffer, rewriting descriptor_set
/// 5. Submit:
///    - Wait on image_available at COMPUTE_SHADER
///    - Signal compute_finished
///    - Signal in_flight
/// 6. Present (waits on compute_finished)
/// ```
pub struct FrameSlot {
    command_buffer: CommandBuffer,
    descriptor_set: vk::DescriptorSet,
    sync: FrameSync,
}

impl FrameSlot {
    #[inline]
    pub fn command_buffer(&self) -> &CommandBuffer {
        &self.command_buffer
    }

    /// Descriptor set holding the kernel's target image.
    #[inline]
    pub fn descriptor_set(&self) -> vk::DescriptorSet {
        self.descriptor_set
    }

    #[inline]
    pub fn sync(&self) -> &FrameSync {
        &self.sync
    }
}

/// All frame slots plus the pools their command buffers and descriptor sets
/// come from.
///
/// # Thread Safety
///
/// Not thread-safe. Only the thread running the frame loop touches it.
pub struct FrameResources {
    // Slots drop before the pools they were allocated from
    slots: Vec<FrameSlot>,
    _descriptor_pool: DescriptorPool,
    _command_pool: CommandPool,
}

impl FrameResources {
    /// Creates [`MAX_FRAMES_IN_FLIGHT`] slots.
    ///
    /// Fences start signaled so the first wait on each slot returns
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if any pool, allocation or sync object creation
    /// fails.
    pub fn new(device: Arc<Device>, set_layout: vk::DescriptorSetLayout) -> RhiResult<Self> {
        let slot_count = MAX_FRAMES_IN_FLIGHT as u32;

        let command_pool = CommandPool::new(device.clone(), device.compute_family())?;
        let command_buffers = command_pool.allocate_command_buffers(slot_count)?;

        let descriptor_pool = DescriptorPool::new(
            device.clone(),
            slot_count,
            &[pool_size(vk::DescriptorType::STORAGE_IMAGE, slot_count)],
        )?;
        let layouts = [set_layout; MAX_FRAMES_IN_FLIGHT];
        let descriptor_sets = descriptor_pool.allocate(&layouts)?;

        let mut slots = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        for (i, (buffer, descriptor_set)) in command_buffers
            .into_iter()
            .zip(descriptor_sets)
            .enumerate()
        {
            slots.push(FrameSlot {
                command_buffer: CommandBuffer::from_handle(device.clone(), buffer),
                descriptor_set,
                sync: FrameSync::new(device.clone())?,
            });
            debug!("Created frame slot {}", i);
        }

        info!(
            "Frame resources created with {} frames in flight",
            slots.len()
        );

        Ok(Self {
            slots,
            _descriptor_pool: descriptor_pool,
            _command_pool: command_pool,
        })
    }

    /// Slot for `index`, wrapped to the slot count.
    #[inline]
    pub fn slot(&self, index: usize) -> &FrameSlot {
        &self.slots[index % self.slots.len()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
