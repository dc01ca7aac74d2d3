//! Runtime configuration.
//!
//! Everything here has a sensible default; environment variables only
//! override individual fields:
//!
//! | variable             | effect                                          |
//! |----------------------|-------------------------------------------------|
//! | `BENCH_FPS`          | present without vsync (uncapped frame rate)     |
//! | `FRACTAL_SHADER`     | path to the compiled compute kernel             |
//! | `FRACTAL_VALIDATION` | `1`/`0` forces Vulkan validation on or off      |

use std::path::PathBuf;

use crate::{Error, Result};

/// Default window width in physical pixels.
pub const DEFAULT_WIDTH: u32 = 512;
/// Default window height in physical pixels.
pub const DEFAULT_HEIGHT: u32 = 512;
/// Default window title.
pub const DEFAULT_TITLE: &str = "Vulkan Interactive Fractal";
/// Default location of the compiled compute kernel, relative to the working
/// directory.
///
/// The kernel is not compiled by cargo. Build it from the GLSL source before
/// the first run:
///
/// ```text
/// glslc shaders/fractal.comp -o shaders/spirv/fractal.comp.spv
/// ```
pub const DEFAULT_SHADER_PATH: &str = "shaders/spirv/fractal.comp.spv";

/// How frames should be paced by the presentation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentModePreference {
    /// Vsync, always available.
    Fifo,
    /// No vsync; used for benchmarking.
    Immediate,
}

/// Explorer configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub shader_path: PathBuf,
    pub present_mode: PresentModePreference,
    pub enable_validation: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            title: DEFAULT_TITLE.to_string(),
            shader_path: PathBuf::from(DEFAULT_SHADER_PATH),
            present_mode: PresentModePreference::Fifo,
            enable_validation: cfg!(debug_assertions),
        }
    }
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if lookup("BENCH_FPS").is_some() {
            config.present_mode = PresentModePreference::Immediate;
        }

        if let Some(path) = lookup("FRACTAL_SHADER")
            && !path.is_empty()
        {
            config.shader_path = PathBuf::from(path);
        }

        if let Some(value) = lookup("FRACTAL_VALIDATION") {
            config.enable_validation = parse_flag("FRACTAL_VALIDATION", &value)?;
        }

        Ok(config)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => Err(Error::Config(format!(
            "{key} must be a boolean flag, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.width, 512);
        assert_eq!(config.height, 512);
        assert_eq!(config.title, "Vulkan Interactive Fractal");
        assert_eq!(config.shader_path, PathBuf::from(DEFAULT_SHADER_PATH));
        assert_eq!(config.present_mode, PresentModePreference::Fifo);
    }

    #[test]
    fn test_bench_fps_selects_immediate() {
        // Presence is enough, the value is ignored.
        let config = Config::from_lookup(lookup_from(&[("BENCH_FPS", "")])).unwrap();
        assert_eq!(config.present_mode, PresentModePreference::Immediate);
    }

    #[test]
    fn test_shader_override() {
        let config =
            Config::from_lookup(lookup_from(&[("FRACTAL_SHADER", "/tmp/k.spv")])).unwrap();
        assert_eq!(config.shader_path, PathBuf::from("/tmp/k.spv"));
    }

    #[test]
    fn test_validation_flag() {
        let on = Config::from_lookup(lookup_from(&[("FRACTAL_VALIDATION", "1")])).unwrap();
        assert!(on.enable_validation);

        let off = Config::from_lookup(lookup_from(&[("FRACTAL_VALIDATION", "off")])).unwrap();
        assert!(!off.enable_validation);

        let bad = Config::from_lookup(lookup_from(&[("FRACTAL_VALIDATION", "maybe")]));
        assert!(matches!(bad, Err(Error::Config(_))));
    }
}
