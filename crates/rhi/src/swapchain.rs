//! Swapchain management.
//!
//! The fractal kernel writes straight into swapchain images, so the
//! swapchain is created with `STORAGE` usage and a format the device can
//! use as a storage image. Image views are not owned here; they belong to
//! the attachment set built on top of [`Swapchain::images`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use ash::vk;
//! use fractal_core::PresentModePreference;
//! use fractal_rhi::device::Device;
//! use fractal_rhi::instance::Instance;
//! use fractal_rhi::swapchain::Swapchain;
//!
//! # fn example(instance: &Instance, device: Arc<Device>, surface: vk::SurfaceKHR, acquire: vk::Semaphore, finished: vk::Semaphore) -> Result<(), fractal_rhi::RhiError> {
//! let mut swapchain = Swapchain::new(instance, device.clone(), surface, 512, 512, PresentModePreference::Fifo)?;
//!
//! if let Some(index) = swapchain.acquire_next_image(acquire)? {
//!     // ... dispatch into swapchain.images()[index as usize] ...
//!     if swapchain.present(device.present_queue(), index, finished)? {
//!         swapchain.recreate(instance, surface, 1024, 768)?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use fractal_core::PresentModePreference;
use tracing::{debug, info, warn};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::instance::Instance;

/// Usage requested for every swapchain image.
pub const SWAPCHAIN_IMAGE_USAGE: vk::ImageUsageFlags = vk::ImageUsageFlags::STORAGE;

/// Swapchain surface support details.
#[derive(Debug, Clone)]
pub struct SwapchainSupportDetails {
    /// Surface capabilities (image count, extents, usage, transforms)
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupportDetails {
    /// Queries swapchain support for a physical device and surface.
    pub fn query(
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
    ) -> RhiResult<Self> {
        let capabilities = unsafe {
            surface_loader.get_physical_device_surface_capabilities(physical_device, surface)?
        };

        let formats = unsafe {
            surface_loader.get_physical_device_surface_formats(physical_device, surface)?
        };

        let present_modes = unsafe {
            surface_loader.get_physical_device_surface_present_modes(physical_device, surface)?
        };

        debug!(
            "Swapchain support: {} formats, {} present modes, image count: {}-{}, usage: {:?}",
            formats.len(),
            present_modes.len(),
            capabilities.min_image_count,
            if capabilities.max_image_count == 0 {
                "unlimited".to_string()
            } else {
                capabilities.max_image_count.to_string()
            },
            capabilities.supported_usage_flags
        );

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    /// At least one format and present mode, and storage usage is allowed.
    #[inline]
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty()
            && !self.present_modes.is_empty()
            && self
                .capabilities
                .supported_usage_flags
                .contains(SWAPCHAIN_IMAGE_USAGE)
    }
}

/// Vulkan swapchain wrapper.
pub struct Swapchain {
    device: Arc<Device>,
    swapchain_loader: ash::khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    format: vk::Format,
    extent: vk::Extent2D,
    present_mode: vk::PresentModeKHR,
    preference: PresentModePreference,
}

impl Swapchain {
    /// Creates a new swapchain for `surface`.
    ///
    /// `width` and `height` are only used when the surface does not report a
    /// fixed extent.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::SwapchainError`] if the surface cannot back storage
    /// images, or a Vulkan error if creation fails.
    pub fn new(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        width: u32,
        height: u32,
        preference: PresentModePreference,
    ) -> RhiResult<Self> {
        let swapchain_loader = ash::khr::swapchain::Device::new(instance.handle(), device.handle());
        let mut swapchain = Self {
            device,
            swapchain_loader,
            swapchain: vk::SwapchainKHR::null(),
            images: Vec::new(),
            format: vk::Format::UNDEFINED,
            extent: vk::Extent2D::default(),
            present_mode: vk::PresentModeKHR::FIFO,
            preference,
        };
        swapchain.build(instance, surface, width, height)?;
        Ok(swapchain)
    }

    /// Recreates the swapchain at a new size, retiring the old one.
    ///
    /// The caller must ensure no submitted work still references the old
    /// images (wait for device idle first). Views created from the old
    /// images become invalid.
    pub fn recreate(
        &mut self,
        instance: &Instance,
        surface: vk::SurfaceKHR,
        width: u32,
        height: u32,
    ) -> RhiResult<()> {
        info!("Recreating swapchain for new size: {}x{}", width, height);
        self.build(instance, surface, width, height)
    }

    fn build(
        &mut self,
        instance: &Instance,
        surface: vk::SurfaceKHR,
        width: u32,
        height: u32,
    ) -> RhiResult<()> {
        let surface_loader = ash::khr::surface::Instance::new(instance.entry(), instance.handle());
        let physical_device = self.device.physical_device();

        let support = SwapchainSupportDetails::query(physical_device, surface, &surface_loader)?;
        if !support.is_adequate() {
            return Err(RhiError::SwapchainError(format!(
                "Surface cannot back storage images (usage {:?}, {} formats, {} present modes)",
                support.capabilities.supported_usage_flags,
                support.formats.len(),
                support.present_modes.len()
            )));
        }

        let surface_format = choose_surface_format(&support.formats, |format| {
            let properties = unsafe {
                instance
                    .handle()
                    .get_physical_device_format_properties(physical_device, format)
            };
            properties
                .optimal_tiling_features
                .contains(vk::FormatFeatureFlags::STORAGE_IMAGE)
        })
        .ok_or_else(|| {
            RhiError::SwapchainError("No surface format supports storage images".to_string())
        })?;

        let present_mode = choose_present_mode(&support.present_modes, self.preference);
        let extent = choose_extent(&support.capabilities, width, height);
        if extent.width == 0 || extent.height == 0 {
            return Err(RhiError::SwapchainError(format!(
                "Cannot create a {}x{} swapchain",
                extent.width, extent.height
            )));
        }
        let image_count = determine_image_count(&support.capabilities);

        info!(
            "Creating swapchain: {}x{}, format {:?}, present mode {:?}, {} images",
            extent.width, extent.height, surface_format.format, present_mode, image_count
        );

        let families = self.device.queue_families();
        let family_indices: Vec<u32> = families.unique_families();
        let (sharing_mode, family_slice) = if families.is_split() {
            debug!(
                "Using CONCURRENT sharing between compute and present families {:?}",
                family_indices
            );
            (vk::SharingMode::CONCURRENT, family_indices.as_slice())
        } else {
            (vk::SharingMode::EXCLUSIVE, &[][..])
        };

        let old_swapchain = self.swapchain;
        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(SWAPCHAIN_IMAGE_USAGE)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(family_slice)
            .pre_transform(support.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let swapchain = unsafe { self.swapchain_loader.create_swapchain(&create_info, None)? };

        if old_swapchain != vk::SwapchainKHR::null() {
            unsafe {
                self.swapchain_loader
                    .destroy_swapchain(old_swapchain, None);
            }
        }
        self.swapchain = swapchain;

        self.images = unsafe { self.swapchain_loader.get_swapchain_images(swapchain)? };
        self.format = surface_format.format;
        self.extent = extent;
        self.present_mode = present_mode;

        info!("Swapchain created with {} images", self.images.len());
        Ok(())
    }

    /// Acquires the next image, signaling `semaphore` when it is ready.
    ///
    /// Returns `None` when the surface is out of date and the swapchain must
    /// be recreated. A suboptimal swapchain still yields an image; staleness
    /// is then reported by [`present`](Self::present).
    pub fn acquire_next_image(&self, semaphore: vk::Semaphore) -> RhiResult<Option<u32>> {
        let result = unsafe {
            self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                semaphore,
                vk::Fence::null(),
            )
        };
        match result {
            Ok((index, _suboptimal)) => Ok(Some(index)),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                debug!("Swapchain out of date on acquire");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Queues `image_index` for presentation after `wait_semaphore`.
    ///
    /// Returns `true` when the swapchain is stale (suboptimal or out of date).
    pub fn present(
        &self,
        queue: vk::Queue,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> RhiResult<bool> {
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [wait_semaphore];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        match unsafe { self.swapchain_loader.queue_present(queue, &present_info) } {
            Ok(suboptimal) => Ok(suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(true),
            Err(e) => Err(e.into()),
        }
    }

    #[inline]
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    #[inline]
    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    /// Images owned by the swapchain, indexed by acquired image index.
    #[inline]
    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        if self.swapchain != vk::SwapchainKHR::null() {
            unsafe {
                self.swapchain_loader
                    .destroy_swapchain(self.swapchain, None);
            }

            info!(
                "Swapchain destroyed (was {}x{}, {} images)",
                self.extent.width,
                self.extent.height,
                self.images.len()
            );
        }
    }
}

/// Picks a surface format usable as a storage image.
///
/// 8-bit UNORM formats are preferred; sRGB formats generally lack storage
/// support.
fn choose_surface_format<F>(
    formats: &[vk::SurfaceFormatKHR],
    supports_storage: F,
) -> Option<vk::SurfaceFormatKHR>
where
    F: Fn(vk::Format) -> bool,
{
    const PREFERRED: [vk::Format; 2] = [vk::Format::B8G8R8A8_UNORM, vk::Format::R8G8B8A8_UNORM];

    for wanted in PREFERRED {
        if let Some(&format) = formats
            .iter()
            .find(|f| f.format == wanted && supports_storage(f.format))
        {
            debug!("Selected surface format {:?}", format.format);
            return Some(format);
        }
    }

    let fallback = formats.iter().copied().find(|f| supports_storage(f.format));
    if let Some(format) = fallback {
        warn!("Using fallback storage-capable surface format {:?}", format.format);
    }
    fallback
}

/// FIFO is always available; IMMEDIATE is used only when requested and supported.
fn choose_present_mode(
    present_modes: &[vk::PresentModeKHR],
    preference: PresentModePreference,
) -> vk::PresentModeKHR {
    match preference {
        PresentModePreference::Immediate
            if present_modes.contains(&vk::PresentModeKHR::IMMEDIATE) =>
        {
            vk::PresentModeKHR::IMMEDIATE
        }
        PresentModePreference::Immediate => {
            warn!("IMMEDIATE present mode unavailable, falling back to FIFO");
            vk::PresentModeKHR::FIFO
        }
        PresentModePreference::Fifo => vk::PresentModeKHR::FIFO,
    }
}

fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    width: u32,
    height: u32,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    vk::Extent2D {
        width: width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

fn determine_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let preferred = capabilities.min_image_count + 1;

    if capabilities.max_image_count > 0 {
        preferred.min(capabilities.max_image_count)
    } else {
        preferred
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface_format(format: vk::Format) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }
    }

    #[test]
    fn test_choose_surface_format_prefers_unorm() {
        let formats = [
            surface_format(vk::Format::B8G8R8A8_SRGB),
            surface_format(vk::Format::R8G8B8A8_UNORM),
            surface_format(vk::Format::B8G8R8A8_UNORM),
        ];

        let selected = choose_surface_format(&formats, |_| true).unwrap();
        assert_eq!(selected.format, vk::Format::B8G8R8A8_UNORM);
    }

    #[test]
    fn test_choose_surface_format_skips_non_storage() {
        let formats = [
            surface_format(vk::Format::B8G8R8A8_UNORM),
            surface_format(vk::Format::A2B10G10R10_UNORM_PACK32),
        ];

        let selected =
            choose_surface_format(&formats, |f| f == vk::Format::A2B10G10R10_UNORM_PACK32)
                .unwrap();
        assert_eq!(selected.format, vk::Format::A2B10G10R10_UNORM_PACK32);

        assert!(choose_surface_format(&formats, |_| false).is_none());
    }

    #[test]
    fn test_choose_present_mode_honors_preference() {
        let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];
        assert_eq!(
            choose_present_mode(&modes, PresentModePreference::Immediate),
            vk::PresentModeKHR::IMMEDIATE
        );
        assert_eq!(
            choose_present_mode(&modes, PresentModePreference::Fifo),
            vk::PresentModeKHR::FIFO
        );
    }

    #[test]
    fn test_choose_present_mode_falls_back_to_fifo() {
        let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX];
        assert_eq!(
            choose_present_mode(&modes, PresentModePreference::Immediate),
            vk::PresentModeKHR::FIFO
        );
    }

    #[test]
    fn test_choose_extent_uses_current() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 1920,
                height: 1080,
            },
            ..Default::default()
        };

        let extent = choose_extent(&capabilities, 800, 600);
        assert_eq!((extent.width, extent.height), (1920, 1080));
    }

    #[test]
    fn test_choose_extent_clamps_to_limits() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: 100,
                height: 100,
            },
            max_image_extent: vk::Extent2D {
                width: 2000,
                height: 2000,
            },
            ..Default::default()
        };

        let extent = choose_extent(&capabilities, 3000, 50);
        assert_eq!((extent.width, extent.height), (2000, 100));

        let extent = choose_extent(&capabilities, 800, 600);
        assert_eq!((extent.width, extent.height), (800, 600));
    }

    #[test]
    fn test_determine_image_count() {
        let capped = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 2,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capped), 2);

        let unlimited = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&unlimited), 3);
    }

    #[test]
    fn test_support_requires_storage_usage() {
        let mut support = SwapchainSupportDetails {
            capabilities: vk::SurfaceCapabilitiesKHR {
                supported_usage_flags: vk::ImageUsageFlags::COLOR_ATTACHMENT,
                ..Default::default()
            },
            formats: vec![surface_format(vk::Format::B8G8R8A8_UNORM)],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(!support.is_adequate());

        support.capabilities.supported_usage_flags |= vk::ImageUsageFlags::STORAGE;
        assert!(support.is_adequate());

        support.present_modes.clear();
        assert!(!support.is_adequate());
    }
}
