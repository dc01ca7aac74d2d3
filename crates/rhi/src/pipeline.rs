//! Compute pipeline management.
//!
//! - [`PipelineLayout`] describes descriptor set layouts and push constant ranges
//! - [`Pipeline`] wraps a compute VkPipeline built from a single shader stage
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::path::Path;
//! use ash::vk;
//! use fractal_rhi::device::Device;
//! use fractal_rhi::shader::Shader;
//! use fractal_rhi::pipeline::{self, Pipeline, PipelineLayout};
//!
//! # fn example(device: Arc<Device>, set_layout: vk::DescriptorSetLayout) -> Result<(), fractal_rhi::RhiError> {
//! let kernel = Shader::from_spirv_file(
//!     device.clone(),
//!     Path::new("shaders/spirv/fractal.comp.spv"),
//!     vk::ShaderStageFlags::COMPUTE,
//!     "main",
//! )?;
//!
//! let range = pipeline::push_constant_range::<[f32; 4]>(vk::ShaderStageFlags::COMPUTE);
//! let layout = PipelineLayout::new(device.clone(), &[set_layout], &[range])?;
//! let pipeline = Pipeline::create_compute(device, &kernel, &layout)?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::shader::Shader;

/// Pipeline layout wrapper.
pub struct PipelineLayout {
    device: Arc<Device>,
    layout: vk::PipelineLayout,
}

impl PipelineLayout {
    /// Creates a pipeline layout.
    ///
    /// # Errors
    ///
    /// Returns an error if layout creation fails.
    pub fn new(
        device: Arc<Device>,
        descriptor_set_layouts: &[vk::DescriptorSetLayout],
        push_constant_ranges: &[vk::PushConstantRange],
    ) -> RhiResult<Self> {
        let create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(descriptor_set_layouts)
            .push_constant_ranges(push_constant_ranges);

        let layout = unsafe { device.handle().create_pipeline_layout(&create_info, None)? };

        debug!(
            "Created pipeline layout with {} descriptor set layout(s) and {} push constant range(s)",
            descriptor_set_layouts.len(),
            push_constant_ranges.len()
        );

        Ok(Self { device, layout })
    }

    /// Returns the Vulkan pipeline layout handle.
    #[inline]
    pub fn handle(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for PipelineLayout {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_pipeline_layout(self.layout, None);
        }
        debug!("Pipeline layout destroyed");
    }
}

/// Pipeline wrapper.
pub struct Pipeline {
    device: Arc<Device>,
    pipeline: vk::Pipeline,
    bind_point: vk::PipelineBindPoint,
}

impl Pipeline {
    /// Creates a compute pipeline from a compute shader.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::PipelineError`] if `shader` is not a compute shader,
    /// or a Vulkan error if pipeline creation fails.
    pub fn create_compute(
        device: Arc<Device>,
        shader: &Shader,
        layout: &PipelineLayout,
    ) -> RhiResult<Self> {
        if shader.stage() != vk::ShaderStageFlags::COMPUTE {
            return Err(RhiError::PipelineError(format!(
                "Compute pipeline needs a compute shader, got {:?}",
                shader.stage()
            )));
        }

        let create_info = vk::ComputePipelineCreateInfo::default()
            .stage(shader.stage_create_info())
            .layout(layout.handle());

        let pipelines = unsafe {
            device
                .handle()
                .create_compute_pipelines(vk::PipelineCache::null(), &[create_info], None)
                .map_err(|(_, result)| result)?
        };

        let pipeline = pipelines
            .into_iter()
            .next()
            .ok_or_else(|| RhiError::PipelineError("Driver returned no pipeline".to_string()))?;

        info!("Compute pipeline created");

        Ok(Self {
            device,
            pipeline,
            bind_point: vk::PipelineBindPoint::COMPUTE,
        })
    }

    /// Returns the Vulkan pipeline handle.
    #[inline]
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    #[inline]
    pub fn bind_point(&self) -> vk::PipelineBindPoint {
        self.bind_point
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_pipeline(self.pipeline, None);
        }
        info!("{:?} pipeline destroyed", self.bind_point);
    }
}

/// Push constant range covering one `T` at offset zero.
pub fn push_constant_range<T>(stages: vk::ShaderStageFlags) -> vk::PushConstantRange {
    vk::PushConstantRange::default()
        .stage_flags(stages)
        .offset(0)
        .size(std::mem::size_of::<T>() as u32)
}
