//! Core types for the rasterizer

use super::math::Sample;

/// Screen-space position: x,y after the viewport transform, z and w as supplied
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Map clip coordinates to pixel space: `((x/w + 1) * width/2, (y/w + 1) * height/2)`
    pub fn from_clip(x: f64, y: f64, z: f64, w: f64, width: u32, height: u32) -> Self {
        Self {
            x: (x / w + 1.0) * width as f64 / 2.0,
            y: (y / w + 1.0) * height as f64 / 2.0,
            z,
            w,
        }
    }
}

/// Linear-space RGBA color, not clamped
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 0.0 }
    }

    pub fn with_alpha(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

/// A vertex fetched from the position and color buffers
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawVertex {
    pub pos: Point,
    pub color: Color,
}

impl RawVertex {
    pub fn new(pos: Point, color: Color) -> Self {
        Self { pos, color }
    }

    /// Prepare the vertex for screen-space interpolation.
    ///
    /// With perspective correction z and rgb are divided by w. Without it they
    /// are left raw, but the q lane still carries 1/w.
    pub fn shade(self, perspective: bool) -> Projected {
        let Point { x, y, z, w } = self.pos;
        let Color { r, g, b, a } = self.color;
        let q = 1.0 / w;
        if perspective {
            Projected(Sample::new(x, y, z * q, q, r * q, g * q, b * q, a))
        } else {
            Projected(Sample::new(x, y, z, q, r, g, b, a))
        }
    }
}

/// Stepping axis for the edge walker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// A sample whose attributes are linear in screen space (the q lane is 1/w)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected(pub Sample);

/// A sample carrying true-space z and color (the q lane is w)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recovered(pub Sample);

impl Projected {
    /// Undo the perspective divide after interpolation
    pub fn recover(self) -> Recovered {
        Recovered(self.0.swap_divide())
    }

    /// Convert for the pixel stage, dividing only when perspective correction is on
    pub fn into_view(self, perspective: bool) -> Recovered {
        if perspective {
            self.recover()
        } else {
            Recovered(self.0)
        }
    }
}

impl Recovered {
    /// Re-apply the perspective divide before interpolating again
    pub fn project(self) -> Projected {
        Projected(self.0.swap_divide())
    }

    pub fn into_screen(self, perspective: bool) -> Projected {
        if perspective {
            self.project()
        } else {
            Projected(self.0)
        }
    }
}

/// Sticky rendering flags
///
/// A flag, once enabled, stays enabled for the rest of the script. The value
/// is immutable; enabling a flag produces a new config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderConfig {
    /// Encode rgb with the linear-to-sRGB transfer function
    pub srgb: bool,
    /// Test and update the depth buffer
    pub depth: bool,
    /// Perspective-correct attribute interpolation
    pub perspective: bool,
}

impl RenderConfig {
    pub fn with_srgb(self) -> Self {
        Self { srgb: true, ..self }
    }

    pub fn with_depth(self) -> Self {
        Self { depth: true, ..self }
    }

    pub fn with_perspective(self) -> Self {
        Self { perspective: true, ..self }
    }
}
