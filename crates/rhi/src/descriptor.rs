//! Descriptor set management.
//!
//! The fractal kernel has a single resource: the storage image it writes.
//! This module wraps the layout and pool objects and provides the small
//! helpers used to point a set at a different image every frame.
//!
//! ```no_run
//! use std::sync::Arc;
//! use ash::vk;
//! use fractal_rhi::device::Device;
//! use fractal_rhi::descriptor::{self, DescriptorPool, DescriptorSetLayout};
//!
//! # fn example(device: Arc<Device>, view: vk::ImageView) -> Result<(), fractal_rhi::RhiError> {
//! let binding = descriptor::storage_image_binding(0, vk::ShaderStageFlags::COMPUTE);
//! let layout = DescriptorSetLayout::new(device.clone(), &[binding])?;
//!
//! let pool = DescriptorPool::new(
//!     device.clone(),
//!     2,
//!     &[descriptor::pool_size(vk::DescriptorType::STORAGE_IMAGE, 2)],
//! )?;
//! let sets = pool.allocate(&[layout.handle(), layout.handle()])?;
//!
//! let info = [descriptor::storage_image_info(view)];
//! descriptor::update_descriptor_sets(
//!     &device,
//!     &[descriptor::write_storage_image(sets[0], 0, &info)],
//! );
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Descriptor set layout wrapper.
pub struct DescriptorSetLayout {
    device: Arc<Device>,
    layout: vk::DescriptorSetLayout,
}

impl DescriptorSetLayout {
    /// Creates a layout from the given bindings.
    ///
    /// # Errors
    ///
    /// Returns an error if layout creation fails.
    pub fn new(
        device: Arc<Device>,
        bindings: &[vk::DescriptorSetLayoutBinding],
    ) -> RhiResult<Self> {
        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(bindings);

        let layout = unsafe {
            device
                .handle()
                .create_descriptor_set_layout(&create_info, None)?
        };

        debug!(
            "Created descriptor set layout with {} binding(s)",
            bindings.len()
        );

        Ok(Self { device, layout })
    }

    /// Returns the Vulkan layout handle.
    #[inline]
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_descriptor_set_layout(self.layout, None);
        }
        debug!("Destroyed descriptor set layout");
    }
}

/// Descriptor pool wrapper.
///
/// Sets allocated from the pool are released when the pool is destroyed.
pub struct DescriptorPool {
    device: Arc<Device>,
    pool: vk::DescriptorPool,
    max_sets: u32,
}

impl DescriptorPool {
    /// Creates a pool able to hold `max_sets` sets drawn from `pool_sizes`.
    ///
    /// # Errors
    ///
    /// Returns an error if pool creation fails.
    pub fn new(
        device: Arc<Device>,
        max_sets: u32,
        pool_sizes: &[vk::DescriptorPoolSize],
    ) -> RhiResult<Self> {
        let create_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(max_sets)
            .pool_sizes(pool_sizes);

        let pool = unsafe { device.handle().create_descriptor_pool(&create_info, None)? };

        debug!(
            "Created descriptor pool: max_sets={}, pool_sizes={}",
            max_sets,
            pool_sizes.len()
        );

        Ok(Self {
            device,
            pool,
            max_sets,
        })
    }

    /// Allocates one set per entry in `layouts`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool is exhausted or allocation fails.
    pub fn allocate(
        &self,
        layouts: &[vk::DescriptorSetLayout],
    ) -> RhiResult<Vec<vk::DescriptorSet>> {
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.pool)
            .set_layouts(layouts);

        let sets = unsafe { self.device.handle().allocate_descriptor_sets(&alloc_info)? };

        debug!("Allocated {} descriptor set(s)", sets.len());

        Ok(sets)
    }

    /// Returns the Vulkan pool handle.
    #[inline]
    pub fn handle(&self) -> vk::DescriptorPool {
        self.pool
    }

    /// Maximum number of sets this pool can hold.
    #[inline]
    pub fn max_sets(&self) -> u32 {
        self.max_sets
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_descriptor_pool(self.pool, None);
        }
        debug!("Destroyed descriptor pool");
    }
}

/// Applies descriptor writes immediately.
///
/// The sets being written must not be in use by a pending submission.
pub fn update_descriptor_sets(device: &Device, writes: &[vk::WriteDescriptorSet]) {
    if writes.is_empty() {
        return;
    }

    unsafe {
        device.handle().update_descriptor_sets(writes, &[]);
    }
}

/// Layout binding for a single storage image.
#[inline]
pub fn storage_image_binding(
    binding: u32,
    stage_flags: vk::ShaderStageFlags,
) -> vk::DescriptorSetLayoutBinding<'static> {
    vk::DescriptorSetLayoutBinding::default()
        .binding(binding)
        .descriptor_type(vk::DescriptorType::STORAGE_IMAGE)
        .descriptor_count(1)
        .stage_flags(stage_flags)
}

#[inline]
pub fn pool_size(ty: vk::DescriptorType, descriptor_count: u32) -> vk::DescriptorPoolSize {
    vk::DescriptorPoolSize::default()
        .ty(ty)
        .descriptor_count(descriptor_count)
}

/// Image info for a storage image accessed in `GENERAL` layout.
#[inline]
pub fn storage_image_info(image_view: vk::ImageView) -> vk::DescriptorImageInfo {
    vk::DescriptorImageInfo::default()
        .sampler(vk::Sampler::null())
        .image_view(image_view)
        .image_layout(vk::ImageLayout::GENERAL)
}

/// Write pointing `binding` of `set` at the given storage image(s).
#[inline]
pub fn write_storage_image(
    set: vk::DescriptorSet,
    binding: u32,
    image_info: &[vk::DescriptorImageInfo],
) -> vk::WriteDescriptorSet<'_> {
    vk::WriteDescriptorSet::default()
        .dst_set(set)
        .dst_binding(binding)
        .dst_array_element(0)
        .descriptor_type(vk::DescriptorType::STORAGE_IMAGE)
        .image_info(image_info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_image_binding() {
        let binding = storage_image_binding(0, vk::ShaderStageFlags::COMPUTE);
        assert_eq!(binding.binding, 0);
        assert_eq!(binding.descriptor_type, vk::DescriptorType::STORAGE_IMAGE);
        assert_eq!(binding.descriptor_count, 1);
        assert_eq!(binding.stage_flags, vk::ShaderStageFlags::COMPUTE);
    }

    #[test]
    fn test_pool_size_helper() {
        let size = pool_size(vk::DescriptorType::STORAGE_IMAGE, 2);
        assert_eq!(size.ty, vk::DescriptorType::STORAGE_IMAGE);
        assert_eq!(size.descriptor_count, 2);
    }

    #[test]
    fn test_storage_image_info_uses_general_layout() {
        let info = storage_image_info(vk::ImageView::null());
        assert_eq!(info.sampler, vk::Sampler::null());
        assert_eq!(info.image_layout, vk::ImageLayout::GENERAL);
    }

    #[test]
    fn test_write_storage_image() {
        let info = [storage_image_info(vk::ImageView::null())];
        let write = write_storage_image(vk::DescriptorSet::null(), 0, &info);
        assert_eq!(write.dst_binding, 0);
        assert_eq!(write.descriptor_type, vk::DescriptorType::STORAGE_IMAGE);
        assert_eq!(write.descriptor_count, 1);
    }
}
