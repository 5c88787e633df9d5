//! Attribute vector math and color transfer functions

use std::ops::{Add, AddAssign, Div, Mul, Sub};

use super::types::Axis;

/// Eight interpolated lanes: position, depth, the homogeneous q lane, color.
///
/// What `z`, `q` and the color lanes mean depends on which side of the
/// perspective divide the sample is on; see `Projected` and `Recovered`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub q: f64,
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Sample {
    #[allow(clippy::too_many_arguments)]
    pub fn new(x: f64, y: f64, z: f64, q: f64, r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { x, y, z, q, r, g, b, a }
    }

    /// Coordinate along a stepping axis
    pub fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    pub fn set_axis(&mut self, axis: Axis, v: f64) {
        match axis {
            Axis::X => self.x = v,
            Axis::Y => self.y = v,
        }
    }

    /// Divide z and rgb by q, then replace q by 1/q.
    ///
    /// Applying it twice returns the original sample.
    pub fn swap_divide(self) -> Self {
        let q = self.q;
        Self {
            z: self.z / q,
            q: 1.0 / q,
            r: self.r / q,
            g: self.g / q,
            b: self.b / q,
            ..self
        }
    }

    pub fn scale(self, s: f64) -> Self {
        Self {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
            q: self.q * s,
            r: self.r * s,
            g: self.g * s,
            b: self.b * s,
            a: self.a * s,
        }
    }
}

impl Add for Sample {
    type Output = Sample;
    fn add(self, o: Sample) -> Sample {
        Sample {
            x: self.x + o.x,
            y: self.y + o.y,
            z: self.z + o.z,
            q: self.q + o.q,
            r: self.r + o.r,
            g: self.g + o.g,
            b: self.b + o.b,
            a: self.a + o.a,
        }
    }
}

impl AddAssign for Sample {
    fn add_assign(&mut self, o: Sample) {
        *self = *self + o;
    }
}

impl Sub for Sample {
    type Output = Sample;
    fn sub(self, o: Sample) -> Sample {
        Sample {
            x: self.x - o.x,
            y: self.y - o.y,
            z: self.z - o.z,
            q: self.q - o.q,
            r: self.r - o.r,
            g: self.g - o.g,
            b: self.b - o.b,
            a: self.a - o.a,
        }
    }
}

impl Mul<f64> for Sample {
    type Output = Sample;
    fn mul(self, s: f64) -> Sample {
        self.scale(s)
    }
}

impl Div<f64> for Sample {
    type Output = Sample;
    fn div(self, s: f64) -> Sample {
        Sample {
            x: self.x / s,
            y: self.y / s,
            z: self.z / s,
            q: self.q / s,
            r: self.r / s,
            g: self.g / s,
            b: self.b / s,
            a: self.a / s,
        }
    }
}

/// Below this the sRGB curve is linear
pub const SRGB_BREAKPOINT: f64 = 0.0031308;

/// Linear light to sRGB encoding (IEC 61966-2-1)
pub fn linear_to_srgb(v: f64) -> f64 {
    if v <= SRGB_BREAKPOINT {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// Scale a unit channel to 8 bits, rounding half to even
pub fn to_channel(v: f64) -> u8 {
    (v * 255.0).round_ties_even().clamp(0.0, 255.0) as u8
}
