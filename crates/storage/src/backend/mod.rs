//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, the seam between the
//! media pipeline and wherever optimized artifacts end up being persisted.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::{MockBackend, WriteFailure};
use crate::error::Result;
use crate::file::FileInfo;
use async_trait::async_trait;
use std::path::Path;

/// Unified interface for storage backends.
///
/// Artifacts are only ever written; replacing or removing them is left to
/// whoever owns the storage root.
///
/// All paths are relative to the storage root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations
/// enforce this validation themselves.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use verdant_storage::{backend::StorageBackend, error::Result};
///
/// async fn store_thumbnail(backend: &dyn StorageBackend, jpeg: &[u8]) -> Result<u64> {
///     let info = backend.write(Path::new("monstera-care/thumbnail/thumbnail.jpg"), jpeg).await?;
///     Ok(info.size)
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend (used for logging only).
    fn name(&self) -> &str;

    /// Persist `data` at `path`, returning the handle of the new artifact.
    ///
    /// # Contract
    /// - Parent directories are created as needed. A directory that already
    ///   exists (including one created concurrently by a sibling write) is
    ///   not an error.
    /// - The write is atomic from a reader's point of view: either the
    ///   complete new content is visible at `path`, or whatever was there
    ///   before is left untouched.
    /// - An existing file at `path` is replaced.
    /// - Something other than a file at `path` (e.g. a directory) fails with
    ///   [`PathConflict`](crate::error::ErrorKind::PathConflict).
    ///
    /// ```no_run
    /// use std::path::Path;
    /// # use verdant_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// let info = backend.write(Path::new("monstera-care/image1.jpg"), b"...").await?;
    /// println!("{} ({} bytes, {:?})", info.path.display(), info.size, info.file_hash);
    /// # Ok(())
    /// # }
    /// ```
    async fn write(&self, path: &Path, data: &[u8]) -> Result<FileInfo>;
}
