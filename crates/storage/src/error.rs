//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::{Error as IoError, ErrorKind as IoErrorKind};
use std::path::{Path, PathBuf};

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
/// Every variant is recoverable from the point of view of a media slot: the
/// slot keeps its remote reference and is marked as a fallback.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Access denied (permissions or read-only filesystem)
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// No space left on the device (or quota exceeded)
    #[display("disk full while writing: {}", _0.display())]
    DiskFull(#[error(not(source))] PathBuf),
    /// The path (or one of its parents) is occupied by something that isn't
    /// a regular file, e.g. a directory where the artifact should go.
    #[display("path conflict: {}", _0.display())]
    PathConflict(#[error(not(source))] PathBuf),
    /// Path contains invalid characters or escapes root
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Classify an I/O error that happened while operating on `path`.
    pub fn from_io(err: IoError, path: &Path) -> Self {
        let path = path.to_path_buf();
        match err.kind() {
            IoErrorKind::PermissionDenied | IoErrorKind::ReadOnlyFilesystem => Self::PermissionDenied(path),
            IoErrorKind::StorageFull | IoErrorKind::QuotaExceeded => Self::DiskFull(path),
            IoErrorKind::IsADirectory | IoErrorKind::NotADirectory | IoErrorKind::AlreadyExists => {
                Self::PathConflict(path)
            },
            _ => Self::Io(err),
        }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::DiskFull(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(IoErrorKind::NotFound, "I/O error")]
    #[case(IoErrorKind::PermissionDenied, "permission denied")]
    #[case(IoErrorKind::ReadOnlyFilesystem, "permission denied")]
    #[case(IoErrorKind::StorageFull, "disk full")]
    #[case(IoErrorKind::IsADirectory, "path conflict")]
    #[case(IoErrorKind::NotADirectory, "path conflict")]
    #[case(IoErrorKind::Interrupted, "I/O error")]
    fn test_from_io(#[case] kind: IoErrorKind, #[case] expected: &str) {
        let err = ErrorKind::from_io(IoError::from(kind), Path::new("owner/image1.jpg"));
        assert!(err.to_string().starts_with(expected), "{err}");
    }

    #[test]
    fn test_vanished_parent_is_plain_io() {
        // A parent removed mid-write has no dedicated kind; it is retryable.
        let err = ErrorKind::from_io(IoError::from(IoErrorKind::NotFound), Path::new("owner/image1.jpg"));
        assert!(matches!(err, ErrorKind::Io(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorKind::DiskFull(PathBuf::from("a")).is_retryable());
        assert!(!ErrorKind::PathConflict(PathBuf::from("a")).is_retryable());
        assert!(!ErrorKind::PermissionDenied(PathBuf::from("a")).is_retryable());
    }
}
