//! RHI-specific error types.

use thiserror::Error;

/// RHI-specific error type.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Vulkan API error
    #[error("Vulkan error: {0}")]
    VulkanError(#[from] ash::vk::Result),

    /// Failed to load Vulkan
    #[error("Failed to load Vulkan: {0}")]
    LoadingError(#[from] ash::LoadingError),

    /// No GPU offers compute with presentation
    #[error("No suitable GPU found")]
    NoSuitableGpu,

    /// A fence did not signal within the requested timeout
    #[error("Fence wait timed out after {0} ns")]
    FenceTimeout(u64),

    /// Shader loading error
    #[error("Shader error: {0}")]
    ShaderError(String),

    /// Surface creation or query error
    #[error("Surface error: {0}")]
    SurfaceError(String),

    /// Swapchain error
    #[error("Swapchain error: {0}")]
    SwapchainError(String),

    /// Invalid handle error
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// Pipeline creation error
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;

impl From<RhiError> for fractal_core::Error {
    fn from(err: RhiError) -> Self {
        match err {
            RhiError::ShaderError(msg) => fractal_core::Error::Shader(msg),
            RhiError::SurfaceError(msg) => fractal_core::Error::Window(msg),
            other => fractal_core::Error::Vulkan(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vk_result_converts() {
        let err: RhiError = ash::vk::Result::ERROR_DEVICE_LOST.into();
        assert!(matches!(err, RhiError::VulkanError(_)));
    }

    #[test]
    fn test_core_error_mapping() {
        let core: fractal_core::Error = RhiError::ShaderError("missing".into()).into();
        assert!(matches!(core, fractal_core::Error::Shader(_)));

        let core: fractal_core::Error = RhiError::FenceTimeout(5).into();
        assert!(matches!(core, fractal_core::Error::Vulkan(_)));
    }
}
