//! Synchronization primitives for Vulkan.
//!
//! - [`Semaphore`] orders work between queue operations (acquire → dispatch → present)
//! - [`Fence`] lets the host wait for a submission to retire
//! - [`FrameSync`] bundles the three objects a frame slot needs
//!
//! ```no_run
//! use std::sync::Arc;
//! use fractal_rhi::device::Device;
//! use fractal_rhi::sync::{Fence, Semaphore};
//!
//! # fn example(device: Arc<Device>) -> Result<(), fractal_rhi::RhiError> {
//! let image_available = Semaphore::new(device.clone())?;
//! let in_flight = Fence::new(device, true)?;
//!
//! in_flight.wait(u64::MAX)?;
//! in_flight.reset()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Vulkan semaphore wrapper.
///
/// Created unsignaled; destroyed on drop.
pub struct Semaphore {
    device: Arc<Device>,
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Creates a new binary semaphore.
    ///
    /// # Errors
    ///
    /// Returns an error if semaphore creation fails.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::default();

        let semaphore = unsafe { device.handle().create_semaphore(&create_info, None)? };

        debug!("Created semaphore");

        Ok(Self { device, semaphore })
    }

    /// Returns the Vulkan semaphore handle.
    #[inline]
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_semaphore(self.semaphore, None);
        }
        debug!("Destroyed semaphore");
    }
}

/// Vulkan fence wrapper.
pub struct Fence {
    device: Arc<Device>,
    fence: vk::Fence,
}

impl Fence {
    /// Creates a new fence.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `signaled` - Start in the signaled state, so that the first wait
    ///   before any submission returns immediately
    ///
    /// # Errors
    ///
    /// Returns an error if fence creation fails.
    pub fn new(device: Arc<Device>, signaled: bool) -> RhiResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };

        let create_info = vk::FenceCreateInfo::default().flags(flags);

        let fence = unsafe { device.handle().create_fence(&create_info, None)? };

        debug!(
            "Created fence ({})",
            if signaled { "signaled" } else { "unsignaled" }
        );

        Ok(Self { device, fence })
    }

    /// Returns the Vulkan fence handle.
    #[inline]
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }

    /// Blocks until the fence is signaled.
    ///
    /// `timeout` is in nanoseconds; `u64::MAX` waits indefinitely.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::FenceTimeout`] if the timeout expires, or the
    /// Vulkan error if the wait fails (e.g. device lost).
    pub fn wait(&self, timeout: u64) -> RhiResult<()> {
        let fences = [self.fence];
        let result = unsafe {
            self.device
                .handle()
                .wait_for_fences(&fences, true, timeout)
        };
        match result {
            Ok(()) => Ok(()),
            Err(vk::Result::TIMEOUT) => Err(RhiError::FenceTimeout(timeout)),
            Err(e) => Err(e.into()),
        }
    }

    /// Resets the fence to the unsignaled state.
    ///
    /// The fence must not be pending on any queue.
    pub fn reset(&self) -> RhiResult<()> {
        let fences = [self.fence];
        unsafe { self.device.handle().reset_fences(&fences)? };
        Ok(())
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_fence(self.fence, None);
        }
        debug!("Destroyed fence");
    }
}

/// Number of frame slots the CPU may record ahead of the GPU.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Synchronization objects owned by one frame slot.
///
/// ```text
/// 1. wait in_flight            (previous submission from this slot retired)
/// 2. acquire                   signals image_available
/// 3. reset in_flight
/// 4. submit                    waits image_available, signals compute_finished + in_flight
/// 5. present                   waits compute_finished
/// ```
pub struct FrameSync {
    image_available: Semaphore,
    compute_finished: Semaphore,
    in_flight: Fence,
}

impl FrameSync {
    /// Creates the slot's semaphores and a pre-signaled fence.
    ///
    /// # Errors
    ///
    /// Returns an error if any object creation fails.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let image_available = Semaphore::new(device.clone())?;
        let compute_finished = Semaphore::new(device.clone())?;
        let in_flight = Fence::new(device, true)?;

        Ok(Self {
            image_available,
            compute_finished,
            in_flight,
        })
    }

    /// Signaled by swapchain acquisition.
    #[inline]
    pub fn image_available(&self) -> &Semaphore {
        &self.image_available
    }

    /// Signaled when the dispatch writing the image completes.
    #[inline]
    pub fn compute_finished(&self) -> &Semaphore {
        &self.compute_finished
    }

    /// Signaled when the slot's submission retires.
    #[inline]
    pub fn in_flight(&self) -> &Fence {
        &self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_frames_in_flight_is_double_buffered() {
        assert_eq!(MAX_FRAMES_IN_FLIGHT, 2);
    }

    #[test]
    fn test_sync_objects_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Semaphore>();
        assert_send_sync::<Fence>();
        assert_send_sync::<FrameSync>();
    }
}
