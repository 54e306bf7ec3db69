//! Media slots for content items, and the pipeline that fills them.
//!
//! An [`Owner`] (a post, a guide) asks for up to a handful of images, each
//! described by an [`AcquisitionRequest`]. The [`Acquirer`] fetches every
//! image, bounds and re-encodes it, and stores it at a path derived purely
//! from the owner's slug and the slot's [`Role`] (see [`resolve`]).
//!
//! Whatever happens on the way, a settled [`MediaSlot`] always has a
//! [`display_reference`](MediaSlot::display_reference): the stored artifact
//! when there is one, the original remote image otherwise.

mod acquire;
pub mod error;
mod owner;
mod path;
mod request;
mod slot;

pub use crate::acquire::{AcquireEvent, Acquirer, DEFAULT_CONCURRENCY, DEFAULT_MAX_SLOTS, validate_batch};
pub use crate::owner::{DisplayItem, OwnerMedia};
pub use crate::path::{resolve, slugify};
pub use crate::request::{AcquisitionRequest, ImageKind, Owner, Role};
pub use crate::slot::{Artifact, DisplayReference, DownloadStatus, FallbackReason, MediaSlot, Stage};
