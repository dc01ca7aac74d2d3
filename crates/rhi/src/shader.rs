//! Shader module management.
//!
//! Loads SPIR-V binaries and wraps them in VkShaderModule objects together
//! with the stage and entry point needed for pipeline creation.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::path::Path;
//! use ash::vk;
//! use fractal_rhi::device::Device;
//! use fractal_rhi::shader::Shader;
//!
//! # fn example(device: Arc<Device>) -> Result<(), fractal_rhi::RhiError> {
//! let kernel = Shader::from_spirv_file(
//!     device,
//!     Path::new("shaders/spirv/fractal.comp.spv"),
//!     vk::ShaderStageFlags::COMPUTE,
//!     "main",
//! )?;
//! let _stage = kernel.stage_create_info();
//! # Ok(())
//! # }
//! ```

use std::ffi::{CStr, CString};
use std::path::Path;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// First word of every SPIR-V module.
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Vulkan shader module wrapper.
pub struct Shader {
    device: Arc<Device>,
    module: vk::ShaderModule,
    stage: vk::ShaderStageFlags,
    entry_point: CString,
}

impl Shader {
    /// Creates a shader module from a SPIR-V file.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::ShaderError`] if the file cannot be read or does not
    /// contain SPIR-V, or a Vulkan error if module creation fails.
    pub fn from_spirv_file(
        device: Arc<Device>,
        path: &Path,
        stage: vk::ShaderStageFlags,
        entry_point: &str,
    ) -> RhiResult<Self> {
        debug!("Loading {:?} shader from {:?}", stage, path);

        let bytes = std::fs::read(path).map_err(|e| {
            RhiError::ShaderError(format!("Failed to read shader file {:?}: {}", path, e))
        })?;

        Self::from_spirv_bytes(device, &bytes, stage, entry_point)
    }

    /// Creates a shader module from SPIR-V bytes.
    pub fn from_spirv_bytes(
        device: Arc<Device>,
        bytes: &[u8],
        stage: vk::ShaderStageFlags,
        entry_point: &str,
    ) -> RhiResult<Self> {
        let code = parse_spirv(bytes)?;

        let entry_point = CString::new(entry_point)
            .map_err(|e| RhiError::ShaderError(format!("Invalid entry point name: {}", e)))?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);
        let module = unsafe { device.handle().create_shader_module(&create_info, None)? };

        info!(
            "Created {:?} shader module ({} words, entry '{}')",
            stage,
            code.len(),
            entry_point.to_string_lossy()
        );

        Ok(Self {
            device,
            module,
            stage,
            entry_point,
        })
    }

    /// Returns the Vulkan shader module handle.
    #[inline]
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    #[inline]
    pub fn stage(&self) -> vk::ShaderStageFlags {
        self.stage
    }

    #[inline]
    pub fn entry_point(&self) -> &CStr {
        &self.entry_point
    }

    /// Stage description for pipeline creation. Borrows from `self`.
    pub fn stage_create_info(&self) -> vk::PipelineShaderStageCreateInfo<'_> {
        vk::PipelineShaderStageCreateInfo::default()
            .stage(self.stage)
            .module(self.module)
            .name(&self.entry_point)
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_shader_module(self.module, None);
        }
        debug!("Destroyed {:?} shader module", self.stage);
    }
}

/// Decodes a SPIR-V binary into 32-bit words.
///
/// Accepts either endianness and rejects data that is misaligned or does
/// not start with the SPIR-V magic number.
pub fn parse_spirv(bytes: &[u8]) -> RhiResult<Vec<u32>> {
    let code = ash::util::read_spv(&mut std::io::Cursor::new(bytes))
        .map_err(|e| RhiError::ShaderError(format!("Invalid SPIR-V: {}", e)))?;

    match code.first() {
        Some(&SPIRV_MAGIC) => Ok(code),
        Some(&word) => Err(RhiError::ShaderError(format!(
            "Invalid SPIR-V magic number {:#010x}",
            word
        ))),
        None => Err(RhiError::ShaderError("Empty SPIR-V module".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words_to_bytes(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn test_parse_spirv_accepts_magic() {
        let bytes = words_to_bytes(&[SPIRV_MAGIC, 0x0001_0000, 0, 1, 0]);
        let code = parse_spirv(&bytes).unwrap();
        assert_eq!(code.len(), 5);
        assert_eq!(code[0], SPIRV_MAGIC);
    }

    #[test]
    fn test_parse_spirv_rejects_misaligned() {
        let mut bytes = words_to_bytes(&[SPIRV_MAGIC, 0]);
        bytes.push(0);
        assert!(matches!(parse_spirv(&bytes), Err(RhiError::ShaderError(_))));
    }

    #[test]
    fn test_parse_spirv_rejects_bad_magic() {
        let bytes = words_to_bytes(&[0xdead_beef, 0]);
        assert!(matches!(parse_spirv(&bytes), Err(RhiError::ShaderError(_))));
    }

    #[test]
    fn test_parse_spirv_rejects_empty() {
        assert!(matches!(parse_spirv(&[]), Err(RhiError::ShaderError(_))));
    }
}
