//! Local filesystem storage backend.
//!
//! Artifacts are stored under a configured root directory. Writes are staged
//! in a temporary file next to their destination and renamed into place, so
//! readers never observe a partially written artifact.

use crate::error::ErrorKind;
use crate::{FileInfo, StorageBackend, error::Result, path::validate as validate_path};
use async_trait::async_trait;
use std::fs::{File, Metadata, create_dir_all as sync_create_dir};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Prefix of the staging files; they live beside their destination until
/// renamed, so they must never collide with an artifact name.
const STAGING_PREFIX: &str = ".verdant-";
const STAGING_SUFFIX: &str = ".partial";

/// Local filesystem storage backend.
///
/// Stores files in a directory on the local filesystem. All paths are relative
/// to the configured root directory.
///
/// # Examples
///
/// ```no_run
/// use verdant_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("local", "/srv/verdant/media").map_err(|e| format!("{e:?}"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    /// Root directory for stored artifacts
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// # Arguments
    /// * `root` - Absolute path to the storage root directory
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, or exists but is not a
    /// directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::PathConflict(root));
            }
        } else {
            // Use non-async here; it'll only happen once on startup and it's
            // not worth the hassle of making the constructor async.
            sync_create_dir(&root).map_err(|e| ErrorKind::from_io(e, &root))?;
        }
        Ok(Self { name: name.into(), root })
    }

    fn metadata(path: &Path, metadata: Metadata) -> Result<FileInfo> {
        let modified = metadata.modified().map_err(ErrorKind::Io)?.into();
        Ok(FileInfo::new(PathBuf::from(path), metadata.len(), modified))
    }

    /// Blocking half of [`write()`](StorageBackend::write): create parents,
    /// stage, fsync, then rename over the destination.
    fn write_atomic(target: &Path, relative: &Path, data: &[u8]) -> Result<FileInfo> {
        let Some(parent) = target.parent() else {
            exn::bail!(ErrorKind::InvalidPath(relative.to_path_buf()));
        };
        // `create_dir_all` already treats a concurrently created directory as
        // success, which is what sibling slots of the same owner rely on.
        sync_create_dir(parent).map_err(|e| ErrorKind::from_io(e, relative))?;
        if let Ok(existing) = target.symlink_metadata()
            && !existing.is_file()
        {
            exn::bail!(ErrorKind::PathConflict(relative.to_path_buf()));
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX).suffix(STAGING_SUFFIX);
        // Staging files default to 0600; artifacts are served to other users.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o644));
        }
        let mut staged = builder.tempfile_in(parent).map_err(|e| ErrorKind::from_io(e, relative))?;
        staged.write_all(data).map_err(|e| ErrorKind::from_io(e, relative))?;
        staged.as_file().sync_all().map_err(|e| ErrorKind::from_io(e, relative))?;
        // On failure the staged file is handed back inside the error and
        // removed when it drops.
        let persisted = staged.persist(target).map_err(|e| ErrorKind::from_io(e.error, relative))?;
        // Best-effort: make the rename itself durable.
        if let Ok(dir) = File::open(parent) {
            _ = dir.sync_all();
        }

        let metadata = persisted.metadata().map_err(|e| ErrorKind::from_io(e, relative))?;
        Ok(Self::metadata(relative, metadata)?.with_file_hash(FileInfo::hash_of(data)))
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, data), fields(backend = %self.name, path = %path.display(), bytes = data.len()))]
    async fn write(&self, path: &Path, data: &[u8]) -> Result<FileInfo> {
        let relative = validate_path(path)?;
        let target = self.root.join(&relative);
        let data = data.to_vec();
        let outcome = tokio::task::spawn_blocking(move || Self::write_atomic(&target, &relative, &data))
            .await
            .map_err(|e| ErrorKind::Io(std::io::Error::other(e)))?;
        let info = outcome?;
        tracing::debug!(size = info.size, "Artifact persisted");
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn backend() -> (tempfile::TempDir, LocalBackend) {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("local", temp_dir.path()).unwrap();
        (temp_dir, backend)
    }

    #[test]
    fn test_new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::new("name", temp_dir.path()).is_ok());
        assert!(LocalBackend::new("name", "relative/path").is_err());
        assert!(LocalBackend::new("name", "./relative").is_err());
    }

    #[test]
    fn test_new_creates_missing_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("media");
        LocalBackend::new("name", &root).unwrap();
        assert!(root.is_dir());
    }

    #[test]
    fn test_new_rejects_file_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("not-a-dir");
        std::fs::write(&root, b"file").unwrap();
        let err = LocalBackend::new("name", &root).err().unwrap();
        assert!(matches!(&*err, ErrorKind::PathConflict(_)));
    }

    #[tokio::test]
    async fn test_write() {
        let (temp_dir, backend) = backend();
        let info = backend.write(Path::new("owner/image1.jpg"), b"jpeg bytes").await.unwrap();
        assert_eq!(info.path, PathBuf::from("owner/image1.jpg"));
        assert_eq!(info.size, 10);
        assert_eq!(info.file_hash, Some(FileInfo::hash_of(b"jpeg bytes")));
        assert_eq!(std::fs::read(temp_dir.path().join("owner/image1.jpg")).unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_write_creates_directories() {
        let (temp_dir, backend) = backend();
        backend.write(Path::new("owner/thumbnail/thumbnail.jpg"), b"data").await.unwrap();
        assert!(temp_dir.path().join("owner/thumbnail").is_dir());
        assert!(temp_dir.path().join("owner/thumbnail/thumbnail.jpg").is_file());
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let (temp_dir, backend) = backend();
        backend.write(Path::new("owner/featured/featured.jpg"), b"first").await.unwrap();
        let info = backend.write(Path::new("owner/featured/featured.jpg"), b"second!").await.unwrap();
        assert_eq!(info.size, 7);
        assert_eq!(std::fs::read(temp_dir.path().join("owner/featured/featured.jpg")).unwrap(), b"second!");
    }

    #[tokio::test]
    async fn test_write_leaves_no_staging_files() {
        let (temp_dir, backend) = backend();
        backend.write(Path::new("owner/image1.jpg"), b"data").await.unwrap();
        backend.write(Path::new("owner/image1.jpg"), b"data again").await.unwrap();
        let names: Vec<_> = std::fs::read_dir(temp_dir.path().join("owner"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["image1.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_write_onto_directory_is_conflict() {
        let (temp_dir, backend) = backend();
        std::fs::create_dir_all(temp_dir.path().join("owner/image2.jpg")).unwrap();
        let err = backend.write(Path::new("owner/image2.jpg"), b"data").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::PathConflict(_)));
        // Nothing replaced the directory.
        assert!(temp_dir.path().join("owner/image2.jpg").is_dir());
    }

    #[tokio::test]
    async fn test_write_below_file_is_conflict() {
        let (temp_dir, backend) = backend();
        std::fs::write(temp_dir.path().join("owner"), b"i am a file").unwrap();
        let err = backend.write(Path::new("owner/thumbnail/thumbnail.jpg"), b"data").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::PathConflict(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_permission_denied() {
        use std::os::unix::fs::PermissionsExt;
        let (temp_dir, backend) = backend();
        let locked = temp_dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();
        // Root ignores directory permissions; nothing to assert in that case.
        if std::fs::write(locked.join("probe"), b"").is_ok() {
            return;
        }
        let err = backend.write(Path::new("locked/image1.jpg"), b"data").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::PermissionDenied(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sibling_writes() {
        let (temp_dir, backend) = backend();
        let backend = Arc::new(backend);
        let handles: Vec<_> = (1..=6)
            .map(|order| {
                let backend = Arc::clone(&backend);
                tokio::spawn(async move {
                    let path = PathBuf::from(format!("owner/image{order}.jpg"));
                    backend.write(&path, format!("image {order}").as_bytes()).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        for order in 1..=6 {
            let data = std::fs::read(temp_dir.path().join(format!("owner/image{order}.jpg"))).unwrap();
            assert_eq!(data, format!("image {order}").as_bytes());
        }
    }

    #[tokio::test]
    async fn test_path_security() {
        let (_temp_dir, backend) = backend();
        let err = backend.write(Path::new("../escape/image1.jpg"), b"data").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
        assert!(backend.write(Path::new("owner/../../passwd"), b"data").await.is_err());
    }
}
