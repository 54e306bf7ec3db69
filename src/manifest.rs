//! JSON input and output of `verdant acquire`.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use std::path::Path;
use verdant_config::PlaceholderConfig;
use verdant_media::{AcquisitionRequest, DisplayItem, DisplayReference, Owner, OwnerMedia, Role, slugify};

/// ```json
/// {
///   "owner": {"id": "17", "title": "Fiddle Leaf Fig Care"},
///   "requests": [
///     {"remote_reference": "https://images.example.com/fig.jpg", "role": "thumbnail"},
///     {"remote_reference": "https://images.example.com/leaf.jpg", "role": "gallery", "order": 1,
///      "caption": "New growth", "alt_text": "A new leaf unfurling", "kind": "closeup"}
///   ]
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub owner: ManifestOwner,
    #[serde(default)]
    pub requests: Vec<AcquisitionRequest>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestOwner {
    pub id: String,
    /// Used as-is when present, otherwise derived from `title`.
    pub slug: Option<String>,
    pub title: Option<String>,
}

impl Manifest {
    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read(path).or_raise(|| ErrorKind::Manifest(path.to_path_buf()))?;
        serde_json::from_slice(&contents).or_raise(|| ErrorKind::Manifest(path.to_path_buf()))
    }
}

impl ManifestOwner {
    pub fn to_owner(&self) -> Result<Owner> {
        let slug = match (&self.slug, &self.title) {
            (Some(slug), _) => slug.clone(),
            (None, Some(title)) => slugify(title),
            (None, None) => exn::bail!(ErrorKind::MissingSlug),
        };
        Ok(Owner::new(self.id.clone(), slug))
    }
}

/// What the presentation layer consumes for one owner.
#[derive(Debug, Serialize)]
pub struct Report {
    pub owner: Owner,
    pub thumbnail: Option<DisplayReference>,
    pub featured: Option<DisplayReference>,
    pub images: Vec<DisplayItem>,
}
impl Report {
    pub fn new(media: &OwnerMedia, placeholders: &PlaceholderConfig) -> Self {
        Self {
            owner: media.owner().clone(),
            thumbnail: media.display_or(Role::Thumbnail, placeholders.thumbnail.as_ref()),
            featured: media.display_or(Role::Featured, placeholders.featured.as_ref()),
            images: media.all_images(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use verdant_fetch::Url;
    use verdant_media::MediaSlot;

    #[test]
    fn test_read_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fig.json");
        std::fs::write(
            &path,
            r#"{
                "owner": {"id": "17", "title": "Fiddle Leaf Fig Care"},
                "requests": [
                    {"remote_reference": "https://images.example.com/fig.jpg", "role": "thumbnail"},
                    {"remote_reference": "https://images.example.com/leaf.jpg", "role": "gallery", "order": 1}
                ]
            }"#,
        )
        .unwrap();
        let manifest = Manifest::read(&path).unwrap();
        assert_eq!(manifest.requests.len(), 2);
        assert_eq!(manifest.owner.to_owner().unwrap(), Owner::new("17", "fiddle-leaf-fig-care"));
    }

    #[rstest]
    #[case("not json at all")]
    #[case(r#"{"requests": []}"#)]
    #[case(r#"{"owner": {"id": "1", "slug": "x"}, "requests": [{"role": "gallery"}]}"#)]
    #[case(r#"{"owner": {"id": "1", "slug": "x"}, "requests": [{"remote_reference": "nope", "role": "gallery"}]}"#)]
    fn test_read_invalid_manifest(#[case] contents: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, contents).unwrap();
        let err = Manifest::read(&path).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Manifest(_)));
    }

    #[test]
    fn test_explicit_slug_wins() {
        let owner = ManifestOwner {
            id: "3".into(),
            slug: Some("monstera".into()),
            title: Some("Monstera Deliciosa Care".into()),
        };
        assert_eq!(owner.to_owner().unwrap().slug, "monstera");
    }

    #[test]
    fn test_owner_without_slug_or_title() {
        let owner = ManifestOwner {
            id: "3".into(),
            slug: None,
            title: None,
        };
        assert!(matches!(&*owner.to_owner().unwrap_err(), ErrorKind::MissingSlug));
    }

    #[test]
    fn test_report_uses_placeholders() {
        let owner = Owner::new("3", "monstera");
        let gallery = Url::parse("https://images.example.com/g1.jpg").unwrap();
        let media =
            OwnerMedia::new(owner, vec![MediaSlot::new("3", AcquisitionRequest::gallery(gallery.clone(), 1))]);
        let placeholders = PlaceholderConfig {
            thumbnail: Some(Url::parse("https://static.example.com/thumb.jpg").unwrap()),
            featured: None,
        };
        let report = Report::new(&media, &placeholders);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["thumbnail"], "https://static.example.com/thumb.jpg");
        assert!(json["featured"].is_null());
        assert_eq!(json["images"][0]["display_reference"], gallery.as_str());
        assert_eq!(json["owner"]["slug"], "monstera");
    }
}
