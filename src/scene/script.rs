//! Scene script parsing
//!
//! One command per line, words separated by whitespace. Lines whose first
//! word is not a known keyword are skipped.

use std::str::FromStr;

use log::debug;

use crate::error::{RasterError, Result};

/// A parsed script command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `png W H file`
    Png { width: u32, height: u32, file: String },
    /// `position dim x y [z [w]] ...` in clip space
    Position { dim: usize, values: Vec<f64> },
    /// `color dim r g b [a] ...`
    Color { dim: usize, values: Vec<f64> },
    /// `elements i0 i1 ...`
    Elements(Vec<usize>),
    Srgb,
    Depth,
    Hyp,
    /// `drawArraysTriangles first count`
    DrawArrays { first: usize, count: usize },
    /// `drawElementsTriangles count offset`
    DrawElements { count: usize, offset: usize },
}

impl Command {
    pub fn keyword(&self) -> &'static str {
        match self {
            Command::Png { .. } => "png",
            Command::Position { .. } => "position",
            Command::Color { .. } => "color",
            Command::Elements(_) => "elements",
            Command::Srgb => "sRGB",
            Command::Depth => "depth",
            Command::Hyp => "hyp",
            Command::DrawArrays { .. } => "drawArraysTriangles",
            Command::DrawElements { .. } => "drawElementsTriangles",
        }
    }
}

/// A command and the 1-based line it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub number: usize,
    pub command: Command,
}

fn parse_num<T: FromStr>(line: usize, what: &str, word: &str) -> Result<T> {
    word.parse()
        .map_err(|_| RasterError::malformed(line, format!("invalid {what} `{word}`")))
}

fn arg<'a>(line: usize, words: &[&'a str], i: usize, keyword: &str) -> Result<&'a str> {
    words.get(i).copied().ok_or_else(|| {
        RasterError::malformed(line, format!("`{keyword}` is missing argument {i}"))
    })
}

/// Parse `dim v0 v1 ...`, checking the dimension range and the value count
fn parse_buffer(
    line: usize,
    keyword: &str,
    args: &[&str],
    dims: std::ops::RangeInclusive<usize>,
) -> Result<(usize, Vec<f64>)> {
    let dim: usize = parse_num(line, "dimension", arg(line, args, 0, keyword)?)?;
    if !dims.contains(&dim) {
        return Err(RasterError::malformed(
            line,
            format!("`{keyword}` dimension must be {}..={}, got {dim}", dims.start(), dims.end()),
        ));
    }
    let values = args[1..]
        .iter()
        .map(|w| parse_num(line, "number", w))
        .collect::<Result<Vec<f64>>>()?;
    if values.len() % dim != 0 {
        return Err(RasterError::malformed(
            line,
            format!("`{keyword}` has {} values, not a multiple of {dim}", values.len()),
        ));
    }
    Ok((dim, values))
}

fn parse_dimension(line: usize, width: &str, height: &str) -> Result<(u32, u32)> {
    match (width.parse::<u32>(), height.parse::<u32>()) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(RasterError::InvalidDimensions {
            line,
            width: width.to_string(),
            height: height.to_string(),
        }),
    }
}

/// Parse one line. Blank lines and unknown keywords give `None`.
pub fn parse_line(number: usize, text: &str) -> Result<Option<Command>> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let Some((&keyword, args)) = words.split_first() else {
        return Ok(None);
    };

    let command = match keyword {
        "png" => {
            if args.len() < 3 {
                return Err(RasterError::malformed(number, "`png` needs width, height and file"));
            }
            let (width, height) = parse_dimension(number, args[0], args[1])?;
            Command::Png {
                width,
                height,
                file: args[2].to_string(),
            }
        }
        "position" => {
            let (dim, values) = parse_buffer(number, keyword, args, 2..=4)?;
            Command::Position { dim, values }
        }
        "color" => {
            let (dim, values) = parse_buffer(number, keyword, args, 3..=4)?;
            Command::Color { dim, values }
        }
        "elements" => Command::Elements(
            args.iter()
                .map(|w| parse_num(number, "index", w))
                .collect::<Result<Vec<usize>>>()?,
        ),
        "sRGB" => Command::Srgb,
        "depth" => Command::Depth,
        "hyp" => Command::Hyp,
        "drawArraysTriangles" => Command::DrawArrays {
            first: parse_num(number, "first", arg(number, args, 0, keyword)?)?,
            count: parse_num(number, "count", arg(number, args, 1, keyword)?)?,
        },
        "drawElementsTriangles" => Command::DrawElements {
            count: parse_num(number, "count", arg(number, args, 0, keyword)?)?,
            offset: parse_num(number, "offset", arg(number, args, 1, keyword)?)?,
        },
        other => {
            debug!("line {}: skipping unknown command `{}`", number, other);
            return Ok(None);
        }
    };
    Ok(Some(command))
}

/// Parse a whole script, stopping at the first malformed line
pub fn parse_script(text: &str) -> Result<Vec<ScriptLine>> {
    let mut lines = Vec::new();
    for (i, text) in text.lines().enumerate() {
        if let Some(command) = parse_line(i + 1, text)? {
            lines.push(ScriptLine {
                number: i + 1,
                command,
            });
        }
    }
    Ok(lines)
}
