use derive_more::Display;
use serde::{Deserialize, Serialize};
use url::Url;

/// Where an image is displayed for its owner. Determines the shape of the
/// storage path; ordering is thumbnail, featured, then gallery.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[display("thumbnail")]
    Thumbnail,
    #[display("featured")]
    Featured,
    #[display("gallery")]
    Gallery,
}

/// Descriptive label for a gallery image. Carried through untouched.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    #[display("overview")]
    Overview,
    #[display("care")]
    Care,
    #[display("closeup")]
    Closeup,
    #[display("indoor")]
    Indoor,
    #[display("healthy")]
    Healthy,
    #[display("decor")]
    Decor,
}

/// The content item a set of slots belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner {
    /// Opaque and stable; never reused for another owner.
    pub id: String,
    /// Filesystem-safe directory name. See [`slugify`](crate::slugify).
    pub slug: String,
}
impl Owner {
    pub fn new(id: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            slug: slug.into(),
        }
    }
}

/// One desired image, as supplied by whoever decides what to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionRequest {
    pub remote_reference: Url,
    pub role: Role,
    /// Display position. Only significant for [`Role::Gallery`], where it
    /// must be unique per owner.
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ImageKind>,
}
impl AcquisitionRequest {
    pub fn new(remote_reference: Url, role: Role) -> Self {
        Self {
            remote_reference,
            role,
            order: 0,
            caption: String::new(),
            alt_text: String::new(),
            kind: None,
        }
    }

    pub fn gallery(remote_reference: Url, order: u32) -> Self {
        Self::new(remote_reference, Role::Gallery).with_order(order)
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    pub fn with_alt_text(mut self, alt_text: impl Into<String>) -> Self {
        self.alt_text = alt_text.into();
        self
    }

    pub fn with_kind(mut self, kind: ImageKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_manifest_json() {
        let request: AcquisitionRequest = serde_json::from_str(
            r#"{
                "remote_reference": "https://images.example.com/fig.jpg",
                "role": "gallery",
                "order": 3,
                "caption": "New growth",
                "kind": "closeup"
            }"#,
        )
        .unwrap();
        assert_eq!(request.role, Role::Gallery);
        assert_eq!(request.order, 3);
        assert_eq!(request.caption, "New growth");
        assert_eq!(request.alt_text, "");
        assert_eq!(request.kind, Some(ImageKind::Closeup));
    }

    #[test]
    fn test_request_defaults() {
        let request: AcquisitionRequest =
            serde_json::from_str(r#"{"remote_reference": "https://images.example.com/t.jpg", "role": "thumbnail"}"#)
                .unwrap();
        assert_eq!(request, AcquisitionRequest::new(request.remote_reference.clone(), Role::Thumbnail));
    }

    #[test]
    fn test_role_ordering() {
        let mut roles = vec![Role::Gallery, Role::Featured, Role::Thumbnail];
        roles.sort();
        assert_eq!(roles, [Role::Thumbnail, Role::Featured, Role::Gallery]);
    }
}
