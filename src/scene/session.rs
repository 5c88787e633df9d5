//! Script execution
//!
//! A session owns the buffers supplied so far, the sticky render flags and
//! the framebuffer of the current image, and turns draw calls into
//! triangles for the rasterizer.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::script::{parse_script, Command, ScriptLine};
use crate::error::{RasterError, Result};
use crate::rasterizer::{
    draw_triangle, Color, Framebuffer, Point, RawVertex, RenderConfig, Triangle,
};
use crate::settings::Settings;

/// The image being rendered and where it goes
pub struct Target {
    pub fb: Framebuffer,
    pub path: PathBuf,
}

/// Colors and whether they carried alpha
#[derive(Debug, Clone, Default)]
pub struct ColorBuffer {
    pub colors: Vec<Color>,
    pub has_alpha: bool,
}

pub struct Session {
    settings: Settings,
    config: RenderConfig,
    output: Option<PathBuf>,
    target: Option<Target>,
    /// Images created so far, including the current one
    images: usize,
    positions: Option<Vec<Point>>,
    colors: Option<ColorBuffer>,
    elements: Option<Vec<usize>>,
    saved: Vec<PathBuf>,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            config: settings.initial_config(),
            output: None,
            target: None,
            images: 0,
            positions: None,
            colors: None,
            elements: None,
            saved: Vec::new(),
        }
    }

    /// Write images here instead of the file named by `png`.
    ///
    /// The first image takes the path as given; later ones get a numeric
    /// suffix (`out.png`, `out-2.png`, `out-3.png`, ...).
    pub fn with_output<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn config(&self) -> RenderConfig {
        self.config
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    /// Execute every command of a script
    pub fn run_script(&mut self, text: &str) -> Result<()> {
        for line in parse_script(text)? {
            self.execute(&line)?;
        }
        Ok(())
    }

    pub fn execute(&mut self, line: &ScriptLine) -> Result<()> {
        let n = line.number;
        match &line.command {
            Command::Png { width, height, file } => {
                self.save_current()?;
                self.images += 1;
                let path = match &self.output {
                    Some(output) => numbered(output, self.images),
                    None => PathBuf::from(file),
                };
                info!("line {}: new {}x{} image -> {}", n, width, height, path.display());
                let (w, h) = (*width as usize, *height as usize);
                let fb = Framebuffer::new(w, h, self.settings.background);
                self.target = Some(Target { fb, path });
            }
            Command::Position { dim, values } => {
                let fb = &self.require_target(n, "position")?.fb;
                let (width, height) = (fb.width as u32, fb.height as u32);
                let mut points = Vec::with_capacity(values.len() / dim);
                for (i, v) in values.chunks_exact(*dim).enumerate() {
                    let z = v.get(2).copied().unwrap_or(0.0);
                    let w = v.get(3).copied().unwrap_or(1.0);
                    let p = Point::from_clip(v[0], v[1], z, w, width, height);
                    if ![p.x, p.y, p.z, p.w].iter().all(|c| c.is_finite()) {
                        return Err(RasterError::malformed(
                            n,
                            format!("vertex {i} has no finite screen position (w = {w})"),
                        ));
                    }
                    points.push(p);
                }
                debug!("line {}: {} positions", n, points.len());
                self.positions = Some(points);
            }
            Command::Color { dim, values } => {
                let colors: Vec<Color> = values
                    .chunks_exact(*dim)
                    .map(|c| Color::with_alpha(c[0], c[1], c[2], c.get(3).copied().unwrap_or(0.0)))
                    .collect();
                debug!("line {}: {} colors (alpha: {})", n, colors.len(), *dim == 4);
                self.colors = Some(ColorBuffer {
                    colors,
                    has_alpha: *dim == 4,
                });
            }
            Command::Elements(indices) => {
                debug!("line {}: {} elements", n, indices.len());
                self.elements = Some(indices.clone());
            }
            Command::Srgb => self.config = self.config.with_srgb(),
            Command::Depth => self.config = self.config.with_depth(),
            Command::Hyp => self.config = self.config.with_perspective(),
            Command::DrawArrays { first, count } => {
                // Only complete triples are drawn
                let end = first.checked_add(count / 3 * 3).ok_or(RasterError::IndexOutOfRange {
                    line: n,
                    buffer: "position",
                    index: *first,
                    len: self.positions.as_ref().map_or(0, Vec::len),
                })?;
                let triples = (*first..end).step_by(3).map(|i| [i, i + 1, i + 2]);
                self.draw(n, "drawArraysTriangles", triples)?;
            }
            Command::DrawElements { count, offset } => {
                let keyword = "drawElementsTriangles";
                let elements = self.elements.as_ref().ok_or(RasterError::MissingState {
                    line: n,
                    command: keyword,
                    missing: "an elements buffer",
                })?;
                let end = offset.checked_add(count / 3 * 3);
                let indices = end
                    .and_then(|end| elements.get(*offset..end))
                    .ok_or(RasterError::IndexOutOfRange {
                        line: n,
                        buffer: "elements",
                        index: end.map_or(*offset, |end| end.saturating_sub(1)),
                        len: elements.len(),
                    })?;
                let triples: Vec<[usize; 3]> =
                    indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
                self.draw(n, keyword, triples)?;
            }
        }
        Ok(())
    }

    fn require_target(&self, line: usize, command: &'static str) -> Result<&Target> {
        self.target.as_ref().ok_or(RasterError::MissingState {
            line,
            command,
            missing: "an image (`png`)",
        })
    }

    /// Draw one triangle per triple of vertex indices, in order
    fn draw<I>(&mut self, line: usize, command: &'static str, triples: I) -> Result<()>
    where
        I: IntoIterator<Item = [usize; 3]>,
    {
        let missing = |missing| RasterError::MissingState {
            line,
            command,
            missing,
        };
        let config = self.config;
        let target = self.target.as_mut().ok_or_else(|| missing("an image (`png`)"))?;
        let positions = self.positions.as_deref().ok_or_else(|| missing("a position buffer"))?;
        let colors = self.colors.as_ref().ok_or_else(|| missing("a color buffer"))?;

        let mut triangles = 0;
        let mut written = 0;
        for [i0, i1, i2] in triples {
            let tri = Triangle::new(
                fetch(line, positions, colors, i0)?,
                fetch(line, positions, colors, i1)?,
                fetch(line, positions, colors, i2)?,
                colors.has_alpha,
            );
            written += draw_triangle(&mut target.fb, &tri, &config);
            triangles += 1;
        }
        debug!(
            "line {}: {} drew {} triangles, {} px ({:?})",
            line, command, triangles, written, config
        );
        Ok(())
    }

    fn save_current(&mut self) -> Result<()> {
        if let Some(target) = self.target.take() {
            target.fb.save_png(&target.path)?;
            info!("saved {}", target.path.display());
            self.saved.push(target.path);
        }
        Ok(())
    }

    /// Save the current image and return every path written
    pub fn finish(mut self) -> Result<Vec<PathBuf>> {
        self.save_current()?;
        Ok(self.saved)
    }
}

/// Look up one vertex in the position and color buffers
fn fetch(
    line: usize,
    positions: &[Point],
    colors: &ColorBuffer,
    index: usize,
) -> Result<RawVertex> {
    let out_of_range = |buffer, len| RasterError::IndexOutOfRange {
        line,
        buffer,
        index,
        len,
    };
    let pos = *positions
        .get(index)
        .ok_or_else(|| out_of_range("position", positions.len()))?;
    let color = *colors
        .colors
        .get(index)
        .ok_or_else(|| out_of_range("color", colors.colors.len()))?;
    Ok(RawVertex::new(pos, color))
}

/// `out.png` for the first image, `out-2.png`, `out-3.png`, ... after that
fn numbered(path: &Path, image: usize) -> PathBuf {
    if image <= 1 {
        return path.to_path_buf();
    }
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}-{}.{}", stem, image, ext.to_string_lossy()),
        None => format!("{}-{}", stem, image),
    };
    path.with_file_name(name)
}

/// Render a script file, returning the images written
pub fn render_file<P: AsRef<Path>>(
    path: P,
    settings: Settings,
    output: Option<PathBuf>,
) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| RasterError::FileUnavailable {
        path: path.display().to_string(),
        source,
    })?;

    let mut session = Session::new(settings);
    if let Some(output) = output {
        session = session.with_output(output);
    }
    session.run_script(&text)?;
    session.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: [u8; 4] = [255, 255, 255, 1];

    fn run(script: &str) -> Session {
        let mut session = Session::new(Settings::default());
        session.run_script(script).unwrap();
        session
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let name = format!("scanline-raster-{}-{}", tag, std::process::id());
        let dir = std::env::temp_dir().join(name);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn pixel(session: &Session, x: usize, y: usize) -> [u8; 4] {
        session.target().unwrap().fb.pixel(x, y)
    }

    #[test]
    fn test_right_triangle_script() {
        let session = run("\
png 8 8 a.png
position 4  -1 -1 0 1   0 -1 0 1   -1 0 0 1
color 3  1 0 0  1 0 0  1 0 0
drawArraysTriangles 0 3
");
        for y in 0..8 {
            for x in 0..8 {
                let expected = if x + y < 4 { [255, 0, 0, 255] } else { BG };
                assert_eq!(pixel(&session, x, y), expected, "pixel ({x},{y})");
            }
        }
    }

    // Near triangle (z 0.2, green) covers the lower-left half, far (z 0.8, blue) the upper-right
    const OVERLAP: &str = "\
png 8 8 b.png
position 4  -1 -1 0.2 1   1 -1 0.2 1   -1 1 0.2 1   -1 -1 0.8 1   1 -1 0.8 1   1 1 0.8 1
color 3  0 1 0  0 1 0  0 1 0  0 0 1  0 0 1  0 0 1
";
    const NEAR: &str = "drawArraysTriangles 0 3\n";
    const FAR: &str = "drawArraysTriangles 3 3\n";

    #[test]
    fn test_depth_resolves_overlap_in_either_order() {
        let near_last = run(&format!("{OVERLAP}depth\n{FAR}{NEAR}"));
        let far_last = run(&format!("{OVERLAP}depth\n{NEAR}{FAR}"));
        assert_eq!(pixel(&near_last, 3, 2), [0, 255, 0, 255]);
        assert_eq!(
            near_last.target().unwrap().fb.pixels,
            far_last.target().unwrap().fb.pixels
        );
    }

    #[test]
    fn test_without_depth_last_draw_wins() {
        let near_last = run(&format!("{OVERLAP}{FAR}{NEAR}"));
        let far_last = run(&format!("{OVERLAP}{NEAR}{FAR}"));
        assert_eq!(pixel(&near_last, 3, 2), [0, 255, 0, 255]);
        assert_eq!(pixel(&far_last, 3, 2), [0, 0, 255, 255]);
    }

    #[test]
    fn test_draw_arrays_covers_all_triangles_from_first() {
        let both = run(&format!("{OVERLAP}drawArraysTriangles 0 6\n"));
        let separate = run(&format!("{OVERLAP}{NEAR}{FAR}"));
        assert_eq!(
            both.target().unwrap().fb.pixels,
            separate.target().unwrap().fb.pixels
        );
        // A trailing partial triple is ignored
        let partial = run(&format!("{OVERLAP}drawArraysTriangles 3 5\n"));
        assert_eq!(pixel(&partial, 3, 2), [0, 0, 255, 255]);
        assert_eq!(pixel(&partial, 1, 5), BG);
    }

    #[test]
    fn test_draw_elements_matches_draw_arrays() {
        let arrays = run(&format!("{OVERLAP}drawArraysTriangles 3 3\n"));
        let elements = run(&format!("{OVERLAP}elements 9 3 4 5\ndrawElementsTriangles 3 1\n"));
        assert_eq!(
            arrays.target().unwrap().fb.pixels,
            elements.target().unwrap().fb.pixels
        );
    }

    #[test]
    fn test_flags_are_sticky() {
        let session = run("png 2 2 c.png\nsRGB\nhyp\nsRGB\n");
        let config = session.config();
        assert!(config.srgb && config.perspective && !config.depth);
    }

    #[test]
    fn test_settings_preset_flags_and_background() {
        let settings = Settings {
            background: [0, 0, 0, 255],
            depth: true,
            ..Settings::default()
        };
        let mut session = Session::new(settings);
        session.run_script("png 2 2 d.png\n").unwrap();
        assert!(session.config().depth);
        assert_eq!(pixel(&session, 1, 1), [0, 0, 0, 255]);
    }

    #[test]
    fn test_alpha_written_for_four_component_colors() {
        let session = run("\
png 4 4 e.png
position 2  -1 -1   1 -1   -1 1
color 4  0 0 1 0.5  0 0 1 0.5  0 0 1 0.5
drawArraysTriangles 0 3
");
        assert_eq!(pixel(&session, 0, 0), [0, 0, 255, 128]);
    }

    #[test]
    fn test_draw_requires_buffers() {
        let mut session = Session::new(Settings::default());
        let err = session
            .run_script("png 4 4 f.png\nposition 2 -1 -1 1 -1 -1 1\ndrawArraysTriangles 0 3\n")
            .unwrap_err();
        assert!(matches!(
            err,
            RasterError::MissingState { line: 3, missing: "a color buffer", .. }
        ));

        let mut session = Session::new(Settings::default());
        let err = session.run_script("position 2 0 0\n").unwrap_err();
        assert!(matches!(err, RasterError::MissingState { line: 1, .. }));

        let mut session = Session::new(Settings::default());
        let err = session.run_script("drawArraysTriangles 0 3\n").unwrap_err();
        assert!(matches!(
            err,
            RasterError::MissingState { line: 1, missing: "an image (`png`)", .. }
        ));

        let mut session = Session::new(Settings::default());
        let err = session
            .run_script("png 4 4 f.png\ndrawElementsTriangles 3 0\n")
            .unwrap_err();
        assert!(matches!(
            err,
            RasterError::MissingState { missing: "an elements buffer", .. }
        ));
    }

    #[test]
    fn test_out_of_range_indices_are_rejected() {
        let base = "png 4 4 g.png\nposition 2 -1 -1 1 -1 -1 1\ncolor 3 1 1 1 1 1 1 1 1 1\n";

        let mut session = Session::new(Settings::default());
        let err = session
            .run_script(&format!("{base}drawArraysTriangles 1 3\n"))
            .unwrap_err();
        assert!(matches!(
            err,
            RasterError::IndexOutOfRange { buffer: "position", index: 3, .. }
        ));

        let mut session = Session::new(Settings::default());
        let err = session
            .run_script(&format!("{base}elements 0 1 2\ndrawElementsTriangles 3 1\n"))
            .unwrap_err();
        assert!(matches!(err, RasterError::IndexOutOfRange { buffer: "elements", .. }));
    }

    #[test]
    fn test_missing_script_file() {
        let err = render_file("/nonexistent/scene.txt", Settings::default(), None).unwrap_err();
        assert!(matches!(err, RasterError::FileUnavailable { .. }));
    }

    #[test]
    fn test_second_png_saves_first_image() {
        let dir = temp_dir("pngs");
        let first = dir.join("first.png");
        let second = dir.join("second.png");
        let script = format!(
            "png 2 2 {}\npng 3 1 {}\n",
            first.display(),
            second.display()
        );
        let script_path = dir.join("scene.txt");
        fs::write(&script_path, script).unwrap();

        let saved = render_file(&script_path, Settings::default(), None).unwrap();
        assert_eq!(saved, vec![first.clone(), second.clone()]);
        let img = image::open(&second).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (3, 1));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_output_override_numbers_later_images() {
        let dir = temp_dir("override");
        let script_path = dir.join("scene.txt");
        fs::write(&script_path, "png 2 2 a.png\npng 2 2 b.png\npng 1 1 c.png\n").unwrap();

        let out = dir.join("out.png");
        let saved = render_file(&script_path, Settings::default(), Some(out.clone())).unwrap();
        assert_eq!(saved, vec![out, dir.join("out-2.png"), dir.join("out-3.png")]);
        assert!(saved.iter().all(|p| p.exists()));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_numbered_without_extension() {
        assert_eq!(numbered(Path::new("img"), 1), PathBuf::from("img"));
        assert_eq!(numbered(Path::new("dir/img"), 4), PathBuf::from("dir/img-4"));
    }

    const TRIANGLE: &str = "\
png 4 4 h.png
position 2  -1 -1   1 -1   -1 1
color 3  1 0 0  1 0 0  1 0 0
";

    #[test]
    fn test_zero_w_position_is_rejected() {
        let mut session = Session::new(Settings::default());
        let err = session
            .run_script("png 8 8 i.png\nposition 4  -1 -1 0 1  1 -1 0 1  0 1 0 0\n")
            .unwrap_err();
        assert!(matches!(err, RasterError::MalformedInput { line: 2, .. }));

        let mut session = Session::new(Settings::default());
        let err = session.run_script("png 8 8 i.png\nposition 2  inf 0\n").unwrap_err();
        assert!(matches!(err, RasterError::MalformedInput { line: 2, .. }));
    }

    #[test]
    fn test_tiny_w_renders_without_hanging() {
        let session = run("\
png 8 8 j.png
position 4  -1 -1 0 1  1 -1 0 1  0 1 0 1e-300
color 3  1 0 0  1 0 0  1 0 0
drawArraysTriangles 0 3
");
        assert_eq!(pixel(&session, 1, 1), [255, 0, 0, 255]);
        assert_eq!(pixel(&session, 6, 7), [255, 0, 0, 255]);
    }

    #[test]
    fn test_huge_draw_arguments_are_rejected() {
        let mut session = Session::new(Settings::default());
        let err = session
            .run_script(&format!("{TRIANGLE}drawArraysTriangles 18446744073709551615 3\n"))
            .unwrap_err();
        assert!(matches!(
            err,
            RasterError::IndexOutOfRange { buffer: "position", index: usize::MAX, .. }
        ));

        let mut session = Session::new(Settings::default());
        let err = session
            .run_script(&format!("{TRIANGLE}drawArraysTriangles 0 18446744073709551615\n"))
            .unwrap_err();
        assert!(matches!(
            err,
            RasterError::IndexOutOfRange { buffer: "position", index: 3, len: 3, .. }
        ));

        let mut session = Session::new(Settings::default());
        let err = session
            .run_script(&format!(
                "{TRIANGLE}elements 0 1 2\ndrawElementsTriangles 3 18446744073709551615\n"
            ))
            .unwrap_err();
        assert!(matches!(err, RasterError::IndexOutOfRange { buffer: "elements", .. }));

        let mut session = Session::new(Settings::default());
        let err = session
            .run_script(&format!(
                "{TRIANGLE}elements 0 1 2\ndrawElementsTriangles 18446744073709551615 2\n"
            ))
            .unwrap_err();
        assert!(matches!(err, RasterError::IndexOutOfRange { buffer: "elements", .. }));
    }
}
