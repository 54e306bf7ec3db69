//! Retrieval of raw bytes for remote media references.
//!
//! The [`Fetch`] trait is the seam the media pipeline depends on;
//! [`HttpFetcher`] is the real implementation:
//!
//! - a hard wall-clock timeout covering connection **and** the full body,
//! - a byte ceiling enforced while streaming (and up front when the server
//!   declares a `Content-Length`), so an oversized response is never buffered,
//! - a small retry budget for transient failures (see
//!   [`ErrorKind::is_retryable`](crate::error::ErrorKind::is_retryable)).
//!
//! A `mock` feature provides [`MockFetcher`] for other crates' tests.

pub mod error;
mod http;
#[cfg(feature = "mock")]
mod mock;

pub use crate::http::{FetchOptions, HttpFetcher};
#[cfg(feature = "mock")]
pub use crate::mock::MockFetcher;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
pub use url::Url;

pub type FetchHandle = Arc<dyn Fetch + Send + Sync>;

/// Raw bytes retrieved for a remote reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    /// `Content-Type` as sent by the server, if any. Informational only; the
    /// optimizer sniffs the real format from the bytes.
    pub content_type: Option<String>,
}

/// Retrieves raw bytes for a remote reference.
///
/// Implementations have no side effects beyond the network call: nothing is
/// written anywhere, whether the fetch succeeds or not.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, reference: &Url) -> Result<Fetched>;
}
