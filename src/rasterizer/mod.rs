//! Scanline software rasterizer
//!
//! Features:
//! - DDA edge walking with pixel-center alignment
//! - Triangles split into upper/lower trapezoids, filled row by row
//! - Perspective-correct interpolation of depth and color
//! - Z-buffer or last-write-wins overlap
//! - Linear to sRGB encoding

mod edge;
mod math;
mod types;
mod render;

pub use edge::*;
pub use math::*;
pub use types::*;
pub use render::*;
