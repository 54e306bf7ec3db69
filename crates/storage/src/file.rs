//! Artifact metadata returned by storage backends.

use std::path::PathBuf;
use time::OffsetDateTime;

/// Metadata describing a file held by a storage backend.
///
/// Returned by [`write()`](crate::StorageBackend::write) as the handle to a
/// freshly persisted artifact, and by [`stat()`](crate::StorageBackend::stat)
/// for anything already on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Relative path from storage root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: OffsetDateTime,
    /// BLAKE3 hash of the content. Only known when the backend had the bytes
    /// in hand (after a write), never calculated by `stat()`.
    pub file_hash: Option<String>,
}
impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: OffsetDateTime) -> Self {
        Self {
            path: path.into(),
            size,
            modified,
            file_hash: None,
        }
    }

    pub fn with_file_hash(mut self, file_hash: impl Into<String>) -> Self {
        self.file_hash = Some(file_hash.into());
        self
    }

    /// Hex-encoded BLAKE3 digest, in the format stored in `file_hash`.
    pub fn hash_of(data: &[u8]) -> String {
        blake3::hash(data).to_hex().to_string()
    }
}
