//! Error types for script processing and rendering

use thiserror::Error;

/// Result type alias for rasterizer operations
pub type Result<T> = std::result::Result<T, RasterError>;

/// Errors that stop script processing
///
/// Every variant is fatal: the session halts and the image in progress is
/// not saved. Out-of-range pixels and degenerate triangles are not errors.
#[derive(Error, Debug)]
pub enum RasterError {
    /// A command's arguments could not be interpreted
    #[error("line {line}: {message}")]
    MalformedInput { line: usize, message: String },

    /// Image width or height is not a positive integer
    #[error("line {line}: width and height must be positive integers, got {width:?} x {height:?}")]
    InvalidDimensions {
        line: usize,
        width: String,
        height: String,
    },

    /// The script file could not be read
    #[error("cannot open script {path}: {source}")]
    FileUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A command needs an image or buffer that has not been supplied yet
    #[error("line {line}: `{command}` requires {missing}")]
    MissingState {
        line: usize,
        command: &'static str,
        missing: &'static str,
    },

    /// A draw call referenced a vertex or index past the end of a buffer
    #[error("line {line}: {buffer} index {index} out of range (len {len})")]
    IndexOutOfRange {
        line: usize,
        buffer: &'static str,
        index: usize,
        len: usize,
    },

    /// Settings file could not be read or parsed
    #[error("settings error: {0}")]
    Config(String),

    /// PNG encoding or writing failed
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ron::error::SpannedError> for RasterError {
    fn from(e: ron::error::SpannedError) -> Self {
        RasterError::Config(e.to_string())
    }
}

impl RasterError {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        RasterError::MalformedInput {
            line,
            message: message.into(),
        }
    }
}
