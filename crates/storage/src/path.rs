//! Path validation for storage-relative paths.
//!
//! Every path handed to a [`StorageBackend`](crate::StorageBackend) is
//! relative to the storage root. Nothing may resolve to a location outside
//! of that root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates and normalizes a storage-relative path.
///
/// `.` components and repeated separators are dropped and `..` is resolved
/// against the components seen so far; popping past the root is an error.
///
/// > **Note:** Backslashes are only separators on Windows. Null bytes are
/// >           rejected explicitly because they truncate C-level syscalls.
///
/// # Returns
/// The normalized path, or [`InvalidPath`](crate::error::ErrorKind::InvalidPath).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use verdant_storage::validate_path;
/// assert!(validate_path("monstera-care/image1.jpg").is_ok());
/// assert!(validate_path("monstera-care/thumbnail/thumbnail.jpg").is_ok());
/// assert!(validate_path("../escape/image1.jpg").is_err());
/// assert!(validate_path("a/../../b").is_err());
/// assert!(validate_path("a\0b").is_err());
/// assert_eq!(
///     validate_path("./monstera-care//featured/./featured.jpg").unwrap(),
///     Path::new("monstera-care/featured/featured.jpg")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(original.to_path_buf());
    let mut normalized = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(segment) if segment.as_encoded_bytes().contains(&0) => exn::bail!(invalid()),
            Component::Normal(segment) => normalized.push(segment),
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if normalized.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if normalized.is_empty() {
        exn::bail!(invalid());
    }
    Ok(normalized.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("owner/image1.jpg", "owner/image1.jpg")]
    #[case("owner//thumbnail//thumbnail.jpg", "owner/thumbnail/thumbnail.jpg")]
    #[case("./owner/./featured/featured.jpg", "owner/featured/featured.jpg")]
    #[case("/owner/image2.jpg", "owner/image2.jpg")]
    #[case("owner/featured/../image3.jpg", "owner/image3.jpg")]
    #[case("owner/image4.jpg/", "owner/image4.jpg")]
    fn test_normalizes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(validate(input).unwrap(), Path::new(expected));
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("./.")]
    #[case("//")]
    #[case("..")]
    #[case("../escape/image1.jpg")]
    #[case("owner/../../image1.jpg")]
    #[case("owner\0/image1.jpg")]
    fn test_rejects(#[case] input: &str) {
        let err = validate(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }
}
