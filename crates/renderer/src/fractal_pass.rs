//! Compute pass that writes the fractal straight into a swapchain image.
//!
//! The kernel binds one storage image at `binding = 0` and reads its
//! parameters from a push constant block:
//!
//! ```glsl
//! layout(push_constant) uniform PushConstants {
//!     vec4 bound;           // min.xy, max.xy
//!     vec2 c;
//!     uint max_iterations;
//! };
//! ```
//!
//! One frame is recorded as:
//!
//! ```text
//! barrier UNDEFINED -> GENERAL           (COMPUTE_SHADER -> COMPUTE_SHADER)
//! rewrite descriptor set to the target view
//! bind pipeline, bind set, push constants
//! dispatch ceil(w / 16) x ceil(h / 16) x 1
//! barrier GENERAL -> PRESENT_SRC_KHR     (COMPUTE_SHADER -> BOTTOM_OF_PIPE)
//! ```
//!
//! The submission waits on the acquire semaphore at [`ACQUIRE_WAIT_STAGE`].
//! The first barrier's source stage must include that stage, otherwise the
//! layout transition is not chained to the semaphore and may run while the
//! presentation engine still reads the image.

use std::path::Path;
use std::sync::Arc;

use ash::vk;
use bytemuck::{Pod, Zeroable};
use tracing::info;

use fractal_rhi::RhiResult;
use fractal_rhi::command::CommandBuffer;
use fractal_rhi::descriptor::{
    DescriptorSetLayout, storage_image_binding, storage_image_info, update_descriptor_sets,
    write_storage_image,
};
use fractal_rhi::device::Device;
use fractal_rhi::image::layout_transition;
use fractal_rhi::pipeline::{Pipeline, PipelineLayout, push_constant_range};
use fractal_rhi::shader::Shader;
use fractal_view::ParameterState;

use crate::attachment::Attachment;

/// Local work group size of the kernel on both axes.
pub const WORKGROUP_SIZE: u32 = 16;

const TARGET_BINDING: u32 = 0;

/// Stage at which a submission waits for its swapchain image.
pub const ACQUIRE_WAIT_STAGE: vk::PipelineStageFlags = vk::PipelineStageFlags::COMPUTE_SHADER;

/// An image barrier together with the stages it synchronizes.
#[derive(Clone, Copy, Debug)]
pub struct StagedBarrier {
    pub src_stage: vk::PipelineStageFlags,
    pub dst_stage: vk::PipelineStageFlags,
    pub barrier: vk::ImageMemoryBarrier<'static>,
}

impl StagedBarrier {
    fn record(&self, cmd: &CommandBuffer) {
        cmd.pipeline_barrier(self.src_stage, self.dst_stage, &[self.barrier]);
    }
}

/// Push constant block consumed by the fractal kernel (28 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct FractalPushConstants {
    /// `min.x, min.y, max.x, max.y` of the visible region
    pub bound: [f32; 4],
    /// Julia constant
    pub c: [f32; 2],
    pub max_iterations: u32,
}

impl FractalPushConstants {
    /// Snapshot of the parameters for one frame.
    pub fn from_params(params: &ParameterState) -> Self {
        let bound = params.bound;
        Self {
            bound: [bound.min.x, bound.min.y, bound.max.x, bound.max.y],
            c: params.constant.to_array(),
            max_iterations: params.iteration_cap(),
        }
    }
}

/// Work group counts covering `extent`, rounding partial tiles up.
pub fn dispatch_group_count(extent: vk::Extent2D) -> (u32, u32, u32) {
    (
        extent.width.div_ceil(WORKGROUP_SIZE),
        extent.height.div_ceil(WORKGROUP_SIZE),
        1,
    )
}

/// Barrier making a freshly acquired image writable by the kernel.
///
/// The previous contents are discarded. The source stage is the acquire
/// wait stage so the transition happens after the image is released.
pub fn acquire_barrier(image: vk::Image) -> StagedBarrier {
    StagedBarrier {
        src_stage: ACQUIRE_WAIT_STAGE,
        dst_stage: vk::PipelineStageFlags::COMPUTE_SHADER,
        barrier: layout_transition(
            image,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::GENERAL,
            vk::AccessFlags::empty(),
            vk::AccessFlags::SHADER_WRITE,
        ),
    }
}

/// Barrier handing the written image over to presentation.
pub fn present_barrier(image: vk::Image) -> StagedBarrier {
    StagedBarrier {
        src_stage: vk::PipelineStageFlags::COMPUTE_SHADER,
        dst_stage: vk::PipelineStageFlags::BOTTOM_OF_PIPE,
        barrier: layout_transition(
            image,
            vk::ImageLayout::GENERAL,
            vk::ImageLayout::PRESENT_SRC_KHR,
            vk::AccessFlags::SHADER_WRITE,
            vk::AccessFlags::empty(),
        ),
    }
}

/// The fractal compute pipeline and its layouts.
pub struct FractalPass {
    device: Arc<Device>,
    // Field order is drop order: pipeline before the layouts it was built from
    pipeline: Pipeline,
    pipeline_layout: PipelineLayout,
    set_layout: DescriptorSetLayout,
}

impl FractalPass {
    /// Loads the SPIR-V kernel at `shader_path` and builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the shader cannot be loaded or pipeline creation
    /// fails.
    pub fn new(device: Arc<Device>, shader_path: &Path) -> RhiResult<Self> {
        let set_layout = DescriptorSetLayout::new(
            device.clone(),
            &[storage_image_binding(
                TARGET_BINDING,
                vk::ShaderStageFlags::COMPUTE,
            )],
        )?;

        let pipeline_layout = PipelineLayout::new(
            device.clone(),
            &[set_layout.handle()],
            &[push_constant_range::<FractalPushConstants>(
                vk::ShaderStageFlags::COMPUTE,
            )],
        )?;

        let shader = Shader::from_spirv_file(
            device.clone(),
            shader_path,
            vk::ShaderStageFlags::COMPUTE,
            "main",
        )?;
        let pipeline = Pipeline::create_compute(device.clone(), &shader, &pipeline_layout)?;

        info!("Fractal pass ready ({:?})", shader_path);

        Ok(Self {
            device,
            pipeline,
            pipeline_layout,
            set_layout,
        })
    }

    /// Layout of the per-slot descriptor sets.
    #[inline]
    pub fn set_layout(&self) -> vk::DescriptorSetLayout {
        self.set_layout.handle()
    }

    /// Records one frame's worth of work targeting `target`.
    ///
    /// `descriptor_set` is rewritten to point at `target`, so it must not be
    /// referenced by a submission that is still executing.
    pub fn encode(
        &self,
        cmd: &CommandBuffer,
        descriptor_set: vk::DescriptorSet,
        target: &Attachment,
        push_constants: &FractalPushConstants,
    ) {
        acquire_barrier(target.image()).record(cmd);

        let image_info = [storage_image_info(target.view())];
        update_descriptor_sets(
            &self.device,
            &[write_storage_image(
                descriptor_set,
                TARGET_BINDING,
                &image_info,
            )],
        );

        let bind_point = self.pipeline.bind_point();
        cmd.bind_pipeline(bind_point, self.pipeline.handle());
        cmd.bind_descriptor_sets(
            bind_point,
            self.pipeline_layout.handle(),
            0,
            &[descriptor_set],
        );
        cmd.push_constants(
            self.pipeline_layout.handle(),
            vk::ShaderStageFlags::COMPUTE,
            0,
            push_constants,
        );

        let (x, y, z) = dispatch_group_count(target.extent());
        cmd.dispatch(x, y, z);

        present_barrier(target.image()).record(cmd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;
    use glam::Vec2;

    #[test]
    fn test_push_constant_layout() {
        assert_eq!(std::mem::size_of::<FractalPushConstants>(), 28);
        assert_eq!(std::mem::offset_of!(FractalPushConstants, bound), 0);
        assert_eq!(std::mem::offset_of!(FractalPushConstants, c), 16);
        assert_eq!(std::mem::offset_of!(FractalPushConstants, max_iterations), 24);
    }

    #[test]
    fn test_push_constants_from_params() {
        let mut params = ParameterState::new(Vec2::new(-0.8, 0.156));
        params.bound.pan(Vec2::new(1.0, 0.0));

        let push = FractalPushConstants::from_params(&params);
        assert_eq!(push.bound, [-3.0, -2.0, 1.0, 2.0]);
        assert_eq!(push.c, [-0.8, 0.156]);
        assert_eq!(push.max_iterations, 200);
    }

    #[test]
    fn test_dispatch_group_count() {
        let count = |width, height| dispatch_group_count(vk::Extent2D { width, height });

        assert_eq!(count(512, 512), (32, 32, 1));
        assert_eq!(count(513, 17), (33, 2, 1));
        assert_eq!(count(1, 1), (1, 1, 1));
        assert_eq!(count(800, 600), (50, 38, 1));
    }

    #[test]
    fn test_acquire_barrier() {
        let image = vk::Image::from_raw(0x1234);
        let barrier = acquire_barrier(image).barrier;

        assert_eq!(barrier.old_layout, vk::ImageLayout::UNDEFINED);
        assert_eq!(barrier.new_layout, vk::ImageLayout::GENERAL);
        assert_eq!(barrier.src_access_mask, vk::AccessFlags::empty());
        assert_eq!(barrier.dst_access_mask, vk::AccessFlags::SHADER_WRITE);
        assert_eq!(barrier.image, image);
    }

    #[test]
    fn test_present_barrier() {
        let image = vk::Image::from_raw(0x1234);
        let barrier = present_barrier(image).barrier;

        assert_eq!(barrier.old_layout, vk::ImageLayout::GENERAL);
        assert_eq!(barrier.new_layout, vk::ImageLayout::PRESENT_SRC_KHR);
        assert_eq!(barrier.src_access_mask, vk::AccessFlags::SHADER_WRITE);
        assert_eq!(barrier.dst_access_mask, vk::AccessFlags::empty());
        assert_eq!(barrier.src_queue_family_index, vk::QUEUE_FAMILY_IGNORED);
    }

    #[test]
    fn test_acquire_barrier_chains_to_semaphore_wait() {
        let acquire = acquire_barrier(vk::Image::from_raw(0x1234));

        // The barrier's first scope must overlap the semaphore wait's second scope
        assert!(acquire.src_stage.contains(ACQUIRE_WAIT_STAGE));
        assert_ne!(acquire.src_stage, vk::PipelineStageFlags::TOP_OF_PIPE);
        assert_eq!(acquire.dst_stage, vk::PipelineStageFlags::COMPUTE_SHADER);
    }

    #[test]
    fn test_present_barrier_stages() {
        let present = present_barrier(vk::Image::from_raw(0x1234));
        assert_eq!(present.src_stage, vk::PipelineStageFlags::COMPUTE_SHADER);
        assert_eq!(present.dst_stage, vk::PipelineStageFlags::BOTTOM_OF_PIPE);
    }
}
