//! Error types for the rowenc library.

use thiserror::Error;

/// Result type alias for rowenc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during image encoding.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid image dimensions (zero width or height).
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },
    /// Pixel data length doesn't match expected size.
    #[error("Invalid pixel data length: expected {expected} samples, got {actual}")]
    InvalidDataLength {
        /// Expected number of samples.
        expected: usize,
        /// Actual number of samples provided.
        actual: usize,
    },
    /// Component count outside 1..=4.
    #[error("Invalid component count {0}: must be 1-4")]
    InvalidComponents(usize),
    /// Invalid quality parameter (must be 1-100 for JPEG).
    #[error("Invalid quality {0}: must be 1-100")]
    InvalidQuality(u8),
    /// Forced PNG filter outside 0..=4.
    #[error("Invalid PNG filter {0}: must be 0-4")]
    InvalidFilter(u8),
    /// Image dimensions exceed maximum supported size.
    #[error("Image {width}x{height} exceeds maximum dimension {max}")]
    ImageTooLarge {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
        /// Maximum supported dimension.
        max: u32,
    },
    /// Encoding was aborted by the caller's stop token.
    #[error("Encoding cancelled")]
    Cancelled,
    /// The output sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for [`Error::Cancelled`]; cancellation is an abort, not a failure of the data.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
