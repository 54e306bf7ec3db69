//! Storage layout for owner media.
//!
//! ```text
//! <owner_slug>/thumbnail/thumbnail.jpg
//! <owner_slug>/featured/featured.jpg
//! <owner_slug>/image<order>.jpg
//! ```
//!
//! Paths are recomputed from the slot every time; nothing caches the mapping.

use crate::Role;
use crate::error::{ErrorKind, Result};
use std::path::PathBuf;
use verdant_optimize::CANONICAL_EXTENSION;

/// Map an owner's slot to its path relative to the storage root.
///
/// Pure and deterministic. `order` is ignored for thumbnail and featured
/// slots, since an owner has at most one of each.
///
/// # Errors
/// [`InvalidSlug`](ErrorKind::InvalidSlug) if `owner_slug` is not a single
/// safe path component.
///
/// # Examples
///
/// ```
/// use verdant_media::{Role, resolve};
///
/// let path = resolve("fiddle-leaf-fig-care", Role::Gallery, 2).unwrap();
/// assert_eq!(path.to_str(), Some("fiddle-leaf-fig-care/image2.jpg"));
/// assert!(resolve("../escape", Role::Thumbnail, 0).is_err());
/// ```
pub fn resolve(owner_slug: &str, role: Role, order: u32) -> Result<PathBuf> {
    validate_slug(owner_slug)?;
    let mut path = PathBuf::from(owner_slug);
    let stem = match role {
        Role::Thumbnail | Role::Featured => {
            path.push(role.to_string());
            role.to_string()
        },
        Role::Gallery => format!("image{order}"),
    };
    path.push(format!("{stem}.{CANONICAL_EXTENSION}"));
    Ok(path)
}

pub(crate) fn validate_slug(slug: &str) -> Result<()> {
    let unsafe_char = |c: char| matches!(c, '/' | '\\') || c.is_control();
    if slug.is_empty() || slug == "." || slug.contains("..") || slug.contains(unsafe_char) {
        exn::bail!(ErrorKind::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

/// Turn a title into a lowercase, hyphenated, filesystem-safe slug.
///
/// Quotation marks are dropped first so that `"Monstera" Care` doesn't come
/// out as `-monstera-care`. The result may be empty for titles without any
/// alphanumeric content, which [`resolve`] will reject.
pub fn slugify(title: &str) -> String {
    // Various quotation marks: '"''""„"`«»
    let marks = [
        '\u{0027}', '\u{0022}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{201E}', '\u{201B}', '\u{0060}',
        '\u{00AB}', '\u{00BB}', '\u{2039}', '\u{203A}',
    ];
    let stripped: String = title.chars().filter(|c| !marks.contains(c)).collect();
    rslug::slugify!(&stripped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case(Role::Thumbnail, 0, "fiddle-leaf-fig-care/thumbnail/thumbnail.jpg")]
    #[case(Role::Thumbnail, 7, "fiddle-leaf-fig-care/thumbnail/thumbnail.jpg")]
    #[case(Role::Featured, 0, "fiddle-leaf-fig-care/featured/featured.jpg")]
    #[case(Role::Gallery, 1, "fiddle-leaf-fig-care/image1.jpg")]
    #[case(Role::Gallery, 0, "fiddle-leaf-fig-care/image0.jpg")]
    #[case(Role::Gallery, 12, "fiddle-leaf-fig-care/image12.jpg")]
    fn test_resolve(#[case] role: Role, #[case] order: u32, #[case] expected: &str) {
        assert_eq!(resolve("fiddle-leaf-fig-care", role, order).unwrap(), PathBuf::from(expected));
    }

    #[test]
    fn test_gallery_paths_are_unique() {
        let paths: Vec<_> = (1..=6).map(|k| resolve("fiddle-leaf-fig-care", Role::Gallery, k).unwrap()).collect();
        let expected: Vec<_> = (1..=6).map(|k| PathBuf::from(format!("fiddle-leaf-fig-care/image{k}.jpg"))).collect();
        assert_eq!(paths, expected);
        assert_eq!(paths.iter().collect::<HashSet<_>>().len(), 6);
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("..")]
    #[case("../escape")]
    #[case("snake..plant")]
    #[case("nested/slug")]
    #[case("/absolute")]
    #[case("windows\\style")]
    #[case("nul\0byte")]
    #[case("new\nline")]
    fn test_resolve_invalid_slug(#[case] slug: &str) {
        let err = resolve(slug, Role::Gallery, 1).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidSlug(slug.to_string()));
    }

    #[rstest]
    #[case("Fiddle Leaf Fig Care", "fiddle-leaf-fig-care")]
    #[case("\"Monstera\" Care Guide", "monstera-care-guide")]
    #[case("Peace Lily: Don't Overwater!", "peace-lily-dont-overwater")]
    #[case("  ZZ Plant  ", "zz-plant")]
    fn test_slugify(#[case] title: &str, #[case] expected: &str) {
        let slug = slugify(title);
        assert_eq!(slug, expected);
        assert!(validate_slug(&slug).is_ok());
    }
}
