//! Error types for annotation file operations.

use thiserror::Error;

/// Errors that can occur while reading or writing annotation files.
#[derive(Error, Debug)]
pub enum FormatError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A record line that does not have the expected shape
    #[error("Malformed record on line {line}: {message}")]
    Malformed {
        /// 1-based line number in the file
        line: usize,
        /// Description of what was wrong
        message: String,
    },

    /// Image dimensions are zero, so coordinates cannot be normalized
    #[error("Image dimensions {width}x{height} cannot be used for normalization")]
    InvalidDimensions {
        /// Image width in pixels
        width: u32,
        /// Image height in pixels
        height: u32,
    },
}

impl FormatError {
    /// Create a malformed record error.
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            message: message.into(),
        }
    }
}
