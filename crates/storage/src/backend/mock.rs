//! In-memory storage backend for testing.

use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::file::FileInfo;
use crate::path::validate as validate_path;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use time::OffsetDateTime;
use tokio::sync::RwLock;

/// Failure a [`MockBackend`] can be told to produce on every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFailure {
    DiskFull,
    PermissionDenied,
    PathConflict,
}

/// In-memory storage backend for testing.
///
/// Files are stored in a `HashMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. Writes can be made
/// to fail deterministically with [`failing_writes()`](Self::failing_writes).
///
/// # Examples
///
/// ```
/// use verdant_storage::backend::{MockBackend, StorageBackend};
/// use std::path::{Path, PathBuf};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let backend = MockBackend::default();
/// backend.write(Path::new("monstera-care/image2.jpg"), b"jpeg").await.unwrap();
/// assert_eq!(backend.writes(), 1);
/// assert_eq!(backend.paths().await, [PathBuf::from("monstera-care/image2.jpg")]);
/// # }
/// ```
pub struct MockBackend {
    name: String,
    storage: RwLock<HashMap<PathBuf, Vec<u8>>>,
    failure: Option<WriteFailure>,
    writes: AtomicUsize,
}

impl MockBackend {
    /// Make every subsequent write fail with the given error.
    pub fn failing_writes(mut self, failure: WriteFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Number of write attempts made so far (failed ones included).
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Paths of every stored file, sorted.
    pub async fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.storage.read().await.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Contents last written to `path`, if any.
    pub async fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.storage.read().await.get(path.as_ref()).cloned()
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            storage: RwLock::default(),
            failure: None,
            writes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<FileInfo> {
        let path = validate_path(path)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Some(WriteFailure::DiskFull) => exn::bail!(ErrorKind::DiskFull(path)),
            Some(WriteFailure::PermissionDenied) => exn::bail!(ErrorKind::PermissionDenied(path)),
            Some(WriteFailure::PathConflict) => exn::bail!(ErrorKind::PathConflict(path)),
            None => {},
        }
        self.storage.write().await.insert(path.clone(), data.to_vec());
        Ok(FileInfo::new(path, data.len() as u64, OffsetDateTime::now_utc()).with_file_hash(FileInfo::hash_of(data)))
    }
}
