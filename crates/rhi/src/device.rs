//! Vulkan logical device and queue management.
//!
//! The [`Device`] owns the VkDevice together with the compute queue the
//! fractal kernel is dispatched on and the queue frames are presented from.
//! Both may be the same queue.

use std::ffi::{CStr, c_char};
use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use crate::error::RhiError;
use crate::instance::Instance;
use crate::physical_device::{PhysicalDeviceInfo, QueueFamilyIndices};

/// Required device extensions.
const DEVICE_EXTENSIONS: &[&CStr] = &[ash::khr::swapchain::NAME];

/// Vulkan logical device wrapper.
///
/// Shared between the swapchain, the frame slots and the pipeline objects
/// through `Arc`; it outlives all of them.
pub struct Device {
    /// Vulkan logical device handle.
    device: ash::Device,
    /// Physical device handle.
    physical_device: vk::PhysicalDevice,
    /// Queue the fractal kernel is submitted to.
    compute_queue: vk::Queue,
    /// Presentation queue handle.
    present_queue: vk::Queue,
    /// Queue family indices.
    queue_families: QueueFamilyIndices,
    /// Family of `compute_queue`.
    compute_family: u32,
}

impl Device {
    /// Creates the logical device with one queue per unique family.
    ///
    /// Enables `shaderStorageImageWriteWithoutFormat` and the swapchain
    /// extension, plus `VK_KHR_portability_subset` where the driver exposes it.
    ///
    /// # Errors
    ///
    /// Returns an error if device creation fails or the selected GPU lacks a
    /// compute or present family.
    pub fn new(
        instance: &Instance,
        physical_device_info: &PhysicalDeviceInfo,
    ) -> Result<Arc<Self>, RhiError> {
        let queue_families = physical_device_info.queue_families;
        let (Some(compute_family), Some(present_family)) =
            (queue_families.compute_family, queue_families.present_family)
        else {
            return Err(RhiError::NoSuitableGpu);
        };

        let unique_families = queue_families.unique_families();
        let queue_priorities = [1.0f32];

        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(&queue_priorities)
            })
            .collect();

        debug!(
            "Creating {} queue(s) for families: {:?}",
            queue_create_infos.len(),
            unique_families
        );

        let features =
            vk::PhysicalDeviceFeatures::default().shader_storage_image_write_without_format(true);

        let mut extension_names: Vec<*const c_char> =
            DEVICE_EXTENSIONS.iter().map(|ext| ext.as_ptr()).collect();
        if physical_device_info.portability_subset {
            extension_names.push(ash::khr::portability_subset::NAME.as_ptr());
        }

        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_names)
            .enabled_features(&features);

        let device = unsafe {
            instance
                .handle()
                .create_device(physical_device_info.device, &create_info, None)?
        };

        info!(
            "Logical device created with {} extension(s)",
            extension_names.len()
        );

        let compute_queue = unsafe { device.get_device_queue(compute_family, 0) };
        debug!("Compute queue retrieved from family {}", compute_family);

        let present_queue = unsafe { device.get_device_queue(present_family, 0) };
        debug!("Present queue retrieved from family {}", present_family);

        Ok(Arc::new(Self {
            device,
            physical_device: physical_device_info.device,
            compute_queue,
            present_queue,
            queue_families,
            compute_family,
        }))
    }

    /// Returns the Vulkan logical device handle.
    #[inline]
    pub fn handle(&self) -> &ash::Device {
        &self.device
    }

    /// Returns the physical device handle.
    #[inline]
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Returns the compute queue handle.
    #[inline]
    pub fn compute_queue(&self) -> vk::Queue {
        self.compute_queue
    }

    /// Returns the presentation queue handle.
    #[inline]
    pub fn present_queue(&self) -> vk::Queue {
        self.present_queue
    }

    /// Returns the queue family indices.
    #[inline]
    pub fn queue_families(&self) -> &QueueFamilyIndices {
        &self.queue_families
    }

    /// Family index of the compute queue.
    #[inline]
    pub fn compute_family(&self) -> u32 {
        self.compute_family
    }

    /// Waits for the device to become idle.
    ///
    /// Blocks until all outstanding work on all queues has completed.
    ///
    /// # Errors
    ///
    /// Returns an error if the wait fails.
    pub fn wait_idle(&self) -> Result<(), RhiError> {
        unsafe { self.device.device_wait_idle()? };
        Ok(())
    }

    /// Submits command buffers to the compute queue.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    /// - All command buffers are valid and recorded
    /// - Synchronization is properly handled
    /// - The fence (if provided) is unsignaled and not in use
    ///
    /// # Errors
    ///
    /// Returns an error if the submission fails.
    pub unsafe fn submit_compute(
        &self,
        submit_infos: &[vk::SubmitInfo],
        fence: vk::Fence,
    ) -> Result<(), RhiError> {
        unsafe {
            self.device
                .queue_submit(self.compute_queue, submit_infos, fence)?;
        }
        Ok(())
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.device.device_wait_idle() {
                tracing::error!("Failed to wait for device idle during drop: {:?}", e);
            }
            self.device.destroy_device(None);
        }
        info!("Logical device destroyed");
    }
}

// Safety: ash::Device is Send+Sync and the remaining fields are plain handles.
unsafe impl Send for Device {}
unsafe impl Sync for Device {}
