//! Error types for the ICDAR conversion pipeline.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors that can occur while parsing, converting or writing a dataset.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The annotation file is not valid XML, has no root element, or carries
    /// unparseable coordinates or grid attributes.
    #[error("Malformed annotation ({}): {message}", .path.display())]
    MalformedAnnotation { path: PathBuf, message: String },

    /// A geometry operation received a polygon without points.
    #[error("Polygon has no points")]
    EmptyPolygon,

    /// Width or height is not strictly positive.
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimension { width: f64, height: f64 },

    /// A file has no partner on the other side of the image/label pairing.
    #[error("No matching image or label for: {}", .path.display())]
    UnmatchedPair { path: PathBuf },

    /// The image header could not be read to obtain its dimensions.
    #[error("Failed to read image size ({}): {message}", .path.display())]
    ImageSize { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConvertError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ConvertError::MalformedAnnotation {
            path: path.into(),
            message: message.into(),
        }
    }
}
