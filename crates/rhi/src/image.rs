//! Image views and layout-transition barriers for color images.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Single mip, single layer color subresource.
#[inline]
pub fn color_subresource_range() -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange::default()
        .aspect_mask(vk::ImageAspectFlags::COLOR)
        .base_mip_level(0)
        .level_count(1)
        .base_array_layer(0)
        .layer_count(1)
}

/// Owned 2D view over an image the caller does not own (e.g. a swapchain image).
pub struct ImageView {
    device: Arc<Device>,
    view: vk::ImageView,
    image: vk::Image,
    format: vk::Format,
}

impl ImageView {
    /// Creates a 2D color view with identity swizzle.
    pub fn new(device: Arc<Device>, image: vk::Image, format: vk::Format) -> RhiResult<Self> {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping::default())
            .subresource_range(color_subresource_range());

        let view = unsafe { device.handle().create_image_view(&create_info, None)? };

        Ok(Self {
            device,
            view,
            image,
            format,
        })
    }

    #[inline]
    pub fn handle(&self) -> vk::ImageView {
        self.view
    }

    #[inline]
    pub fn image(&self) -> vk::Image {
        self.image
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }
}

impl Drop for ImageView {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_image_view(self.view, None);
        }
        debug!("Destroyed image view");
    }
}

/// Layout transition for the whole color subresource, without queue
/// ownership transfer.
pub fn layout_transition(
    image: vk::Image,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
    src_access: vk::AccessFlags,
    dst_access: vk::AccessFlags,
) -> vk::ImageMemoryBarrier<'static> {
    vk::ImageMemoryBarrier::default()
        .src_access_mask(src_access)
        .dst_access_mask(dst_access)
        .old_layout(old_layout)
        .new_layout(new_layout)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(color_subresource_range())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_subresource_range() {
        let range = color_subresource_range();
        assert_eq!(range.aspect_mask, vk::ImageAspectFlags::COLOR);
        assert_eq!(range.level_count, 1);
        assert_eq!(range.layer_count, 1);
    }

    #[test]
    fn test_layout_transition_fields() {
        let barrier = layout_transition(
            vk::Image::null(),
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::GENERAL,
            vk::AccessFlags::empty(),
            vk::AccessFlags::SHADER_WRITE,
        );
        assert_eq!(barrier.old_layout, vk::ImageLayout::UNDEFINED);
        assert_eq!(barrier.new_layout, vk::ImageLayout::GENERAL);
        assert_eq!(barrier.src_access_mask, vk::AccessFlags::empty());
        assert_eq!(barrier.dst_access_mask, vk::AccessFlags::SHADER_WRITE);
        assert_eq!(barrier.src_queue_family_index, vk::QUEUE_FAMILY_IGNORED);
    }
}
