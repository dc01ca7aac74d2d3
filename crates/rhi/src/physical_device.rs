//! Physical device (GPU) selection.
//!
//! The explorer renders with a compute kernel straight into swapchain images,
//! so a GPU qualifies when it has:
//! 1. a compute queue family and a family that can present to the surface
//! 2. the swapchain extension
//! 3. `shaderStorageImageWriteWithoutFormat`, since the kernel writes to an
//!    image declared without a format qualifier
//!
//! Among suitable GPUs, discrete ones are preferred.

use std::ffi::CStr;

use ash::vk;
use tracing::{debug, info, warn};

use crate::error::RhiError;

/// Queue family indices used by the explorer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    /// Family the fractal kernel is dispatched on.
    pub compute_family: Option<u32>,
    /// Family used for presentation. May equal `compute_family`.
    pub present_family: Option<u32>,
}

impl QueueFamilyIndices {
    /// Both a compute and a present family were found.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.compute_family.is_some() && self.present_family.is_some()
    }

    /// Whether compute and present run on different families.
    #[inline]
    pub fn is_split(&self) -> bool {
        self.compute_family != self.present_family
    }

    /// Returns the unique queue family indices as a vector.
    pub fn unique_families(&self) -> Vec<u32> {
        let mut families = Vec::with_capacity(2);

        if let Some(compute) = self.compute_family {
            families.push(compute);
        }
        if let Some(present) = self.present_family
            && !families.contains(&present)
        {
            families.push(present);
        }

        families
    }
}

/// What a single queue family offers, as far as selection is concerned.
#[derive(Clone, Copy, Debug)]
pub struct QueueFamilyCapabilities {
    pub flags: vk::QueueFlags,
    pub queue_count: u32,
    pub supports_present: bool,
}

/// Chooses compute and present families.
///
/// A family that does both is preferred so that one queue serves the whole
/// frame. Otherwise the first compute family and the first presenting family
/// are used.
pub fn pick_queue_families(families: &[QueueFamilyCapabilities]) -> QueueFamilyIndices {
    let mut indices = QueueFamilyIndices::default();

    for (i, family) in families.iter().enumerate() {
        let i = i as u32;
        if family.queue_count == 0 {
            continue;
        }

        let has_compute = family.flags.contains(vk::QueueFlags::COMPUTE);

        if has_compute && family.supports_present {
            return QueueFamilyIndices {
                compute_family: Some(i),
                present_family: Some(i),
            };
        }

        if has_compute && indices.compute_family.is_none() {
            indices.compute_family = Some(i);
        }
        if family.supports_present && indices.present_family.is_none() {
            indices.present_family = Some(i);
        }
    }

    indices
}

/// Information about a physical device (GPU).
#[derive(Clone)]
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle.
    pub device: vk::PhysicalDevice,
    /// Device properties (name, limits, API version, etc.).
    pub properties: vk::PhysicalDeviceProperties,
    /// Supported device features.
    pub features: vk::PhysicalDeviceFeatures,
    /// Queue family indices for compute and presentation.
    pub queue_families: QueueFamilyIndices,
    /// The device exposes `VK_KHR_portability_subset` and must enable it.
    pub portability_subset: bool,
}

impl PhysicalDeviceInfo {
    /// Returns the device name as a string.
    pub fn device_name(&self) -> &str {
        unsafe {
            CStr::from_ptr(self.properties.device_name.as_ptr())
                .to_str()
                .unwrap_or("Unknown Device")
        }
    }

    /// Returns a human-readable string for the device type.
    pub fn device_type_name(&self) -> &'static str {
        device_type_name(self.properties.device_type)
    }

    /// Returns the Vulkan API version supported by the device.
    pub fn api_version(&self) -> (u32, u32, u32) {
        let version = self.properties.api_version;
        (
            vk::api_version_major(version),
            vk::api_version_minor(version),
            vk::api_version_patch(version),
        )
    }
}

impl std::fmt::Debug for PhysicalDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (major, minor, patch) = self.api_version();
        f.debug_struct("PhysicalDeviceInfo")
            .field("name", &self.device_name())
            .field("type", &self.device_type_name())
            .field("api_version", &format!("{}.{}.{}", major, minor, patch))
            .field("queue_families", &self.queue_families)
            .finish()
    }
}

fn device_type_name(device_type: vk::PhysicalDeviceType) -> &'static str {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => "Discrete GPU",
        vk::PhysicalDeviceType::INTEGRATED_GPU => "Integrated GPU",
        vk::PhysicalDeviceType::VIRTUAL_GPU => "Virtual GPU",
        vk::PhysicalDeviceType::CPU => "CPU",
        _ => "Other",
    }
}

/// Selects the most suitable physical device for compute-to-swapchain rendering.
///
/// # Errors
///
/// Returns [`RhiError::NoSuitableGpu`] if no GPU meets the requirements.
pub fn select_physical_device(
    instance: &ash::Instance,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Result<PhysicalDeviceInfo, RhiError> {
    let devices = unsafe { instance.enumerate_physical_devices()? };

    if devices.is_empty() {
        warn!("No Vulkan-capable GPUs found");
        return Err(RhiError::NoSuitableGpu);
    }

    info!("Found {} GPU(s)", devices.len());

    let mut suitable_devices: Vec<(PhysicalDeviceInfo, u32)> = Vec::new();

    for device in devices {
        if let Some(info) = check_device_suitability(instance, device, surface, surface_loader)? {
            let score = rate_device(info.properties.device_type, &info.queue_families);
            debug!(
                "GPU '{}' ({}) - Score: {}",
                info.device_name(),
                info.device_type_name(),
                score
            );
            suitable_devices.push((info, score));
        }
    }

    suitable_devices.sort_by(|a, b| b.1.cmp(&a.1));
    let Some((selected_device, score)) = suitable_devices.into_iter().next() else {
        warn!("No GPU offers compute, presentation and format-less storage writes");
        return Err(RhiError::NoSuitableGpu);
    };

    let (major, minor, patch) = selected_device.api_version();
    info!(
        "Selected GPU: '{}' ({}) - Vulkan {}.{}.{}, Score: {}",
        selected_device.device_name(),
        selected_device.device_type_name(),
        major,
        minor,
        patch,
        score
    );

    Ok(selected_device)
}

fn check_device_suitability(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Result<Option<PhysicalDeviceInfo>, RhiError> {
    let properties = unsafe { instance.get_physical_device_properties(device) };
    let features = unsafe { instance.get_physical_device_features(device) };

    let device_name = unsafe {
        CStr::from_ptr(properties.device_name.as_ptr())
            .to_str()
            .unwrap_or("Unknown")
    };

    let queue_families = find_queue_families(instance, device, surface, surface_loader)?;
    if !queue_families.is_complete() {
        debug!(
            "GPU '{}' skipped: missing queue families (compute={}, present={})",
            device_name,
            queue_families.compute_family.is_some(),
            queue_families.present_family.is_some()
        );
        return Ok(None);
    }

    if features.shader_storage_image_write_without_format == vk::FALSE {
        debug!(
            "GPU '{}' skipped: shaderStorageImageWriteWithoutFormat not supported",
            device_name
        );
        return Ok(None);
    }

    let extensions = unsafe { instance.enumerate_device_extension_properties(device)? };
    let has_extension = |wanted: &CStr| {
        extensions.iter().any(|ext| {
            let name = unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) };
            name == wanted
        })
    };

    if !has_extension(ash::khr::swapchain::NAME) {
        debug!("GPU '{}' skipped: VK_KHR_swapchain missing", device_name);
        return Ok(None);
    }

    Ok(Some(PhysicalDeviceInfo {
        device,
        properties,
        features,
        queue_families,
        portability_subset: has_extension(ash::khr::portability_subset::NAME),
    }))
}

fn find_queue_families(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Result<QueueFamilyIndices, RhiError> {
    let properties = unsafe { instance.get_physical_device_queue_family_properties(device) };

    let mut families = Vec::with_capacity(properties.len());
    for (i, family) in properties.iter().enumerate() {
        let supports_present = unsafe {
            surface_loader.get_physical_device_surface_support(device, i as u32, surface)?
        };
        families.push(QueueFamilyCapabilities {
            flags: family.queue_flags,
            queue_count: family.queue_count,
            supports_present,
        });
    }

    Ok(pick_queue_families(&families))
}

/// Higher scores indicate more desirable devices.
fn rate_device(device_type: vk::PhysicalDeviceType, families: &QueueFamilyIndices) -> u32 {
    let mut score = match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 10000,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 1000,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 100,
        vk::PhysicalDeviceType::CPU => 10,
        _ => 1,
    };

    // One queue for dispatch and present avoids ownership juggling.
    if !families.is_split() {
        score += 500;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags, supports_present: bool) -> QueueFamilyCapabilities {
        QueueFamilyCapabilities {
            flags,
            queue_count: 1,
            supports_present,
        }
    }

    #[test]
    fn test_queue_family_indices_default() {
        let indices = QueueFamilyIndices::default();
        assert!(indices.compute_family.is_none());
        assert!(indices.present_family.is_none());
        assert!(!indices.is_complete());
    }

    #[test]
    fn test_prefers_family_that_computes_and_presents() {
        let families = [
            family(vk::QueueFlags::COMPUTE, false),
            family(vk::QueueFlags::TRANSFER, true),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE, true),
        ];
        let indices = pick_queue_families(&families);
        assert_eq!(indices.compute_family, Some(2));
        assert_eq!(indices.present_family, Some(2));
        assert!(!indices.is_split());
    }

    #[test]
    fn test_falls_back_to_split_families() {
        let families = [
            family(vk::QueueFlags::TRANSFER, true),
            family(vk::QueueFlags::COMPUTE, false),
        ];
        let indices = pick_queue_families(&families);
        assert_eq!(indices.compute_family, Some(1));
        assert_eq!(indices.present_family, Some(0));
        assert!(indices.is_split());
        assert_eq!(indices.unique_families(), vec![1, 0]);
    }

    #[test]
    fn test_empty_families_are_skipped() {
        let families = [QueueFamilyCapabilities {
            flags: vk::QueueFlags::COMPUTE,
            queue_count: 0,
            supports_present: true,
        }];
        assert!(!pick_queue_families(&families).is_complete());
    }

    #[test]
    fn test_incomplete_without_present() {
        let families = [family(vk::QueueFlags::COMPUTE, false)];
        let indices = pick_queue_families(&families);
        assert_eq!(indices.compute_family, Some(0));
        assert!(!indices.is_complete());
    }

    #[test]
    fn test_unique_families_shared() {
        let indices = QueueFamilyIndices {
            compute_family: Some(3),
            present_family: Some(3),
        };
        assert_eq!(indices.unique_families(), vec![3]);
    }

    #[test]
    fn test_rate_prefers_discrete_and_shared_queue() {
        let shared = QueueFamilyIndices {
            compute_family: Some(0),
            present_family: Some(0),
        };
        let split = QueueFamilyIndices {
            compute_family: Some(1),
            present_family: Some(0),
        };
        assert!(
            rate_device(vk::PhysicalDeviceType::DISCRETE_GPU, &split)
                > rate_device(vk::PhysicalDeviceType::INTEGRATED_GPU, &shared)
        );
        assert!(
            rate_device(vk::PhysicalDeviceType::INTEGRATED_GPU, &shared)
                > rate_device(vk::PhysicalDeviceType::INTEGRATED_GPU, &split)
        );
    }
}
