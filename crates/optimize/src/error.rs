//! Optimizer Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An optimizer error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for optimizer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bytes are not a raster image format this build can decode.
    #[display("unsupported image format")]
    UnsupportedFormat,
    /// The format was recognised but the data is corrupt or truncated. Don't
    /// retry with the same input.
    #[display("failed to decode image")]
    DecodeFailure,
    /// Re-encoding to the canonical format failed.
    #[display("failed to encode image")]
    Encode,
    /// Quality outside 1..=100, or a zero bound.
    #[display("invalid optimizer options: {_0}")]
    InvalidOptions(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
