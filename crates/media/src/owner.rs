use crate::slot::{DisplayReference, DownloadStatus, MediaSlot};
use crate::{ImageKind, Owner, Role};
use serde::Serialize;
use url::Url;

/// The settled slots of one owner, sorted by `(role, order)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerMedia {
    owner: Owner,
    slots: Vec<MediaSlot>,
}

/// What the presentation layer receives for each slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayItem {
    pub role: Role,
    /// Sort position across all roles: thumbnail is -1, featured 0, and
    /// gallery images use their own order.
    pub position: i64,
    pub order: u32,
    pub display_reference: DisplayReference,
    pub caption: String,
    pub alt_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ImageKind>,
    pub download_status: DownloadStatus,
}
impl From<&MediaSlot> for DisplayItem {
    fn from(slot: &MediaSlot) -> Self {
        let position = match slot.role() {
            Role::Thumbnail => -1,
            Role::Featured => 0,
            Role::Gallery => i64::from(slot.order()),
        };
        Self {
            role: slot.role(),
            position,
            order: slot.order(),
            display_reference: slot.display_reference(),
            caption: slot.caption().to_string(),
            alt_text: slot.alt_text().to_string(),
            kind: slot.kind(),
            download_status: slot.download_status(),
        }
    }
}

impl OwnerMedia {
    pub fn new(owner: Owner, mut slots: Vec<MediaSlot>) -> Self {
        slots.sort_by_key(|slot| (slot.role(), slot.order()));
        Self { owner, slots }
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn slots(&self) -> &[MediaSlot] {
        &self.slots
    }

    pub fn thumbnail(&self) -> Option<&MediaSlot> {
        self.slots.iter().find(|slot| slot.role() == Role::Thumbnail)
    }

    pub fn featured(&self) -> Option<&MediaSlot> {
        self.slots.iter().find(|slot| slot.role() == Role::Featured)
    }

    /// Gallery slots in display order.
    pub fn gallery(&self) -> impl Iterator<Item = &MediaSlot> {
        self.slots.iter().filter(|slot| slot.role() == Role::Gallery)
    }

    /// The display reference of the first slot with `role`, or `placeholder`
    /// when the owner has no such slot.
    pub fn display_or(&self, role: Role, placeholder: Option<&Url>) -> Option<DisplayReference> {
        self.slots
            .iter()
            .find(|slot| slot.role() == role)
            .map(MediaSlot::display_reference)
            .or_else(|| placeholder.cloned().map(DisplayReference::Remote))
    }

    /// Every slot as a [`DisplayItem`], sorted by position.
    pub fn all_images(&self) -> Vec<DisplayItem> {
        let mut items: Vec<DisplayItem> = self.slots.iter().map(DisplayItem::from).collect();
        items.sort_by_key(|item| (item.position, item.role));
        items
    }

    pub fn downloaded_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.download_status() == DownloadStatus::Downloaded).count()
    }

    /// `true` once no slot is still pending.
    pub fn is_settled(&self) -> bool {
        self.slots.iter().all(|slot| slot.download_status() != DownloadStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AcquisitionRequest;

    fn url(name: &str) -> Url {
        Url::parse(&format!("https://images.example.com/{name}.jpg")).unwrap()
    }

    fn media() -> OwnerMedia {
        let owner = Owner::new("7", "snake-plant");
        let slots = vec![
            MediaSlot::new("7", AcquisitionRequest::gallery(url("g2"), 2)),
            MediaSlot::new("7", AcquisitionRequest::new(url("featured"), Role::Featured)),
            MediaSlot::new("7", AcquisitionRequest::gallery(url("g1"), 1)),
            MediaSlot::new("7", AcquisitionRequest::new(url("thumb"), Role::Thumbnail)),
        ];
        OwnerMedia::new(owner, slots)
    }

    #[test]
    fn test_slots_are_sorted() {
        let media = media();
        let roles: Vec<_> = media.slots().iter().map(|slot| (slot.role(), slot.order())).collect();
        assert_eq!(roles, [(Role::Thumbnail, 0), (Role::Featured, 0), (Role::Gallery, 1), (Role::Gallery, 2)]);
        assert_eq!(media.gallery().map(MediaSlot::order).collect::<Vec<_>>(), [1, 2]);
        assert_eq!(media.thumbnail().map(|slot| slot.remote_reference()), Some(&url("thumb")));
        assert_eq!(media.featured().map(|slot| slot.remote_reference()), Some(&url("featured")));
    }

    #[test]
    fn test_all_images_positions() {
        let positions: Vec<_> = media().all_images().iter().map(|item| item.position).collect();
        assert_eq!(positions, [-1, 0, 1, 2]);
    }

    #[test]
    fn test_display_or_placeholder() {
        let media = OwnerMedia::new(
            Owner::new("7", "snake-plant"),
            vec![MediaSlot::new("7", AcquisitionRequest::gallery(url("g1"), 1))],
        );
        let placeholder = url("placeholder");
        assert_eq!(
            media.display_or(Role::Thumbnail, Some(&placeholder)),
            Some(DisplayReference::Remote(placeholder.clone()))
        );
        assert_eq!(media.display_or(Role::Featured, None), None);
        assert_eq!(media.display_or(Role::Gallery, Some(&placeholder)), Some(DisplayReference::Remote(url("g1"))));
    }

    #[test]
    fn test_pending_is_not_settled() {
        assert!(!media().is_settled());
        assert_eq!(media().downloaded_count(), 0);
    }

    #[test]
    fn test_display_item_serialization() {
        let item = DisplayItem::from(&MediaSlot::new(
            "7",
            AcquisitionRequest::gallery(url("g1"), 1).with_caption("Variegated leaves"),
        ));
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["role"], "gallery");
        assert_eq!(json["display_reference"], "https://images.example.com/g1.jpg");
        assert_eq!(json["download_status"], "pending");
        assert_eq!(json["caption"], "Variegated leaves");
        assert!(json.get("kind").is_none());
    }
}
