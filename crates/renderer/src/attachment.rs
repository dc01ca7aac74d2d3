//! Views over the swapchain images the kernel writes into.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use fractal_rhi::device::Device;
use fractal_rhi::image::ImageView;
use fractal_rhi::swapchain::Swapchain;
use fractal_rhi::{RhiError, RhiResult};

/// One swapchain image together with its storage view.
pub struct Attachment {
    view: ImageView,
    extent: vk::Extent2D,
}

impl Attachment {
    #[inline]
    pub fn image(&self) -> vk::Image {
        self.view.image()
    }

    #[inline]
    pub fn view(&self) -> vk::ImageView {
        self.view.handle()
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.view.format()
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

/// One [`Attachment`] per swapchain image, indexed by the acquired image
/// index.
///
/// The set is only ever replaced as a whole. It must be cleared before the
/// swapchain is recreated and rebuilt afterwards.
pub struct AttachmentSet {
    device: Arc<Device>,
    attachments: Vec<Attachment>,
}

impl AttachmentSet {
    /// Creates a view for every image of `swapchain`.
    ///
    /// # Errors
    ///
    /// Returns an error if view creation fails.
    pub fn new(device: Arc<Device>, swapchain: &Swapchain) -> RhiResult<Self> {
        let attachments = Self::create_attachments(&device, swapchain)?;
        Ok(Self {
            device,
            attachments,
        })
    }

    /// Releases every view. Call before the underlying images go away.
    pub fn clear(&mut self) {
        self.attachments.clear();
    }

    /// Replaces all attachments with views of the current `swapchain` images.
    ///
    /// # Errors
    ///
    /// Returns an error if view creation fails; the set is left empty.
    pub fn rebuild(&mut self, swapchain: &Swapchain) -> RhiResult<()> {
        self.attachments.clear();
        self.attachments = Self::create_attachments(&self.device, swapchain)?;
        Ok(())
    }

    /// Attachment for the acquired `image_index`.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::InvalidHandle`] if the index is out of range.
    pub fn get(&self, image_index: u32) -> RhiResult<&Attachment> {
        self.attachments.get(image_index as usize).ok_or_else(|| {
            RhiError::InvalidHandle(format!(
                "Swapchain image index {} out of range ({} attachments)",
                image_index,
                self.attachments.len()
            ))
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    fn create_attachments(device: &Arc<Device>, swapchain: &Swapchain) -> RhiResult<Vec<Attachment>> {
        let extent = swapchain.extent();
        let attachments = swapchain
            .images()
            .iter()
            .map(|&image| {
                Ok(Attachment {
                    view: ImageView::new(device.clone(), image, swapchain.format())?,
                    extent,
                })
            })
            .collect::<RhiResult<Vec<_>>>()?;

        debug!(
            "Created {} attachment(s) at {}x{}",
            attachments.len(),
            extent.width,
            extent.height
        );

        Ok(attachments)
    }
}
