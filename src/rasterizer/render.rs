//! Core rendering functions
//! Scanline triangle fill with optional depth test and perspective correction

use std::path::Path;

use log::trace;

use super::edge::walk_within;
use super::math::{linear_to_srgb, to_channel};
use super::types::{Axis, Projected, RawVertex, Recovered, RenderConfig};
use crate::error::Result;

/// Per-pixel nearest depth seen so far
pub struct DepthBuffer {
    pub values: Vec<f64>,
    pub width: usize,
    pub height: usize,
}

impl DepthBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            values: vec![f64::INFINITY; width * height],
            width,
            height,
        }
    }

    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.values[y * self.width + x]
    }

    /// Store `z` if it is strictly nearer than the current value
    pub fn test_and_set(&mut self, x: usize, y: usize, z: f64) -> bool {
        let idx = y * self.width + x;
        if z < self.values[idx] {
            self.values[idx] = z;
            true
        } else {
            false
        }
    }
}

/// Framebuffer for software rendering
pub struct Framebuffer {
    pub pixels: Vec<u8>, // RGBA, 4 bytes per pixel
    /// Allocated the first time a depth-tested triangle is drawn
    pub depth: Option<DepthBuffer>,
    pub width: usize,
    pub height: usize,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize, background: [u8; 4]) -> Self {
        let mut fb = Self {
            pixels: vec![0; width * height * 4],
            depth: None,
            width,
            height,
        };
        fb.clear(background);
        fb
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
        self.depth = None;
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let idx = (y * self.width + x) * 4;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: [u8; 4]) {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 4;
            self.pixels[idx..idx + 4].copy_from_slice(&color);
        }
    }

    pub fn depth_mut(&mut self) -> &mut DepthBuffer {
        let (width, height) = (self.width, self.height);
        self.depth.get_or_insert_with(|| DepthBuffer::new(width, height))
    }

    /// Encode the framebuffer as an RGBA PNG
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        image::save_buffer_with_format(
            path,
            &self.pixels,
            self.width as u32,
            self.height as u32,
            image::ExtendedColorType::Rgba8,
            image::ImageFormat::Png,
        )?;
        Ok(())
    }
}

/// Three vertices and how their color buffer was declared
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub vertices: [RawVertex; 3],
    /// The color buffer had four components, so alpha is written out
    pub has_alpha: bool,
}

impl Triangle {
    pub fn new(v0: RawVertex, v1: RawVertex, v2: RawVertex, has_alpha: bool) -> Self {
        Self {
            vertices: [v0, v1, v2],
            has_alpha,
        }
    }
}

/// Walking window along an axis of `size` pixels: one sample of margin on each side
fn window(size: usize) -> (f64, f64) {
    (-1.0, size as f64 + 1.0)
}

/// Rasterize a single triangle. Returns the number of pixels written.
///
/// Edges are only walked over rows that can reach the framebuffer, so huge
/// off-screen triangles cost no more than the rows they cover.
pub fn draw_triangle(fb: &mut Framebuffer, tri: &Triangle, config: &RenderConfig) -> usize {
    let perspective = config.perspective;
    let (min_y, max_y) = window(fb.height);
    let mut shaded = tri.vertices.map(|v| v.shade(perspective));
    // Stable: vertices on the same row keep their submission order
    shaded.sort_by(|a, b| a.0.y.total_cmp(&b.0.y));
    let [top, mid, bottom] = shaded;

    let edge = |a: Projected, b: Projected| -> Vec<Recovered> {
        walk_within(a.0, b.0, Axis::Y, min_y, max_y)
            .into_iter()
            .map(|s| Projected(s).into_view(perspective))
            .collect()
    };

    let long = edge(top, bottom);
    let upper = edge(top, mid);
    let lower = edge(mid, bottom);

    let written = fill_edges(fb, [long, upper, lower].concat(), config, tri.has_alpha);
    trace!(
        "triangle ({:.2},{:.2}) ({:.2},{:.2}) ({:.2},{:.2}): {} px",
        top.0.x, top.0.y, mid.0.x, mid.0.y, bottom.0.x, bottom.0.y, written
    );
    written
}

/// Row of a sample, rounding half to even
fn row_of(s: &Recovered) -> i64 {
    s.0.y.round_ties_even() as i64
}

/// Fill between edge samples row by row.
///
/// Every adjacent pair of samples on a row bounds one span, so a row with
/// three samples yields two spans.
pub fn fill_edges(
    fb: &mut Framebuffer,
    mut samples: Vec<Recovered>,
    config: &RenderConfig,
    has_alpha: bool,
) -> usize {
    let perspective = config.perspective;
    let (min_x, max_x) = window(fb.width);
    samples.sort_by(|a, b| a.0.y.total_cmp(&b.0.y).then(a.0.x.total_cmp(&b.0.x)));

    let mut written = 0;
    for row in samples.chunk_by(|a, b| row_of(a) == row_of(b)) {
        for pair in row.windows(2) {
            let left = pair[0].into_screen(perspective);
            let right = pair[1].into_screen(perspective);
            for s in walk_within(left.0, right.0, Axis::X, min_x, max_x) {
                let s = Projected(s).into_view(perspective);
                if write_sample(fb, &s, config, has_alpha) {
                    written += 1;
                }
            }
        }
    }
    written
}

/// Depth test, encode and store one sample. Returns true if the pixel changed.
///
/// Samples that round outside the framebuffer, negative coordinates
/// included, are dropped.
pub fn write_sample(
    fb: &mut Framebuffer,
    sample: &Recovered,
    config: &RenderConfig,
    has_alpha: bool,
) -> bool {
    let s = sample.0;
    let x = s.x.round_ties_even();
    let y = s.y.round_ties_even();
    // Also rejects NaN
    if !(x >= 0.0 && y >= 0.0) {
        return false;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return false;
    }

    if config.depth && !fb.depth_mut().test_and_set(x, y, s.z) {
        return false;
    }

    let encode = |v: f64| {
        if config.srgb {
            to_channel(linear_to_srgb(v))
        } else {
            to_channel(v)
        }
    };
    let alpha = if has_alpha { to_channel(s.a) } else { 255 };
    fb.set_pixel(x, y, [encode(s.r), encode(s.g), encode(s.b), alpha]);
    true
}
