//! Renderer settings
//!
//! Uses RON (Rusty Object Notation) for an optional, human-readable settings
//! file. Every field has a default so a partial file is accepted.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rasterizer::RenderConfig;

/// Background of a freshly created image: white with alpha 1
pub const DEFAULT_BACKGROUND: [u8; 4] = [255, 255, 255, 1];

/// Settings applied to every image a script creates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// RGBA fill for new framebuffers
    pub background: [u8; 4],
    /// Start with sRGB encoding enabled
    pub srgb: bool,
    /// Start with depth testing enabled
    pub depth: bool,
    /// Start with perspective-correct interpolation enabled
    pub perspective: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            background: DEFAULT_BACKGROUND,
            srgb: false,
            depth: false,
            perspective: false,
        }
    }
}

impl Settings {
    /// The sticky flags a script starts from
    pub fn initial_config(&self) -> RenderConfig {
        RenderConfig {
            srgb: self.srgb,
            depth: self.depth,
            perspective: self.perspective,
        }
    }
}

/// Load settings from a RON file
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = fs::read_to_string(path)?;
    load_settings_from_str(&contents)
}

/// Load settings from a RON string
pub fn load_settings_from_str(s: &str) -> Result<Settings> {
    Ok(ron::from_str(s)?)
}
