//! Scanline Raster: script-driven software triangle rasterizer
//!
//! Reads a small scene script (buffers, flags, draw calls) and renders it
//! into PNG images:
//! - DDA edge walking and scanline fill
//! - Perspective-correct color and depth interpolation
//! - Optional depth buffer
//! - Optional linear to sRGB encoding

pub mod error;
pub mod rasterizer;
pub mod scene;
pub mod settings;

pub use error::{RasterError, Result};
pub use settings::Settings;

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
