//! Media Error Types
//!
//! Only caller defects surface here. Environmental failures while acquiring a
//! single slot (network, decoding, disk) never become an [`Error`]; they are
//! recorded on the slot as a [`FallbackReason`](crate::FallbackReason).

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A media error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Malformed input from the caller. Every variant fails the whole batch
/// before any network or disk I/O takes place.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The owner slug is empty, or contains a path separator, a traversal
    /// sequence or a control character.
    #[display("invalid owner slug: {_0:?}")]
    InvalidSlug(#[error(not(source))] String),
    /// Two requests in one batch resolve to the same storage path.
    #[display("more than one request resolves to {}", _0.display())]
    DuplicateSlot(#[error(not(source))] PathBuf),
    #[display("{requested} requests exceeds the limit of {max} per owner")]
    TooManySlots { requested: usize, max: usize },
    /// A slot was handed back for an owner it doesn't belong to.
    #[display("slot belongs to owner {slot_owner:?}, not {owner:?}")]
    OwnerMismatch { owner: String, slot_owner: String },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
