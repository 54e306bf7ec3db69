//! Canned responses for testing code that depends on [`Fetch`].

use crate::error::{ErrorKind, Result};
use crate::{Fetch, Fetched};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

/// In-memory [`Fetch`] implementation for testing.
///
/// References without a registered response answer with
/// [`BadStatus(404)`](ErrorKind::BadStatus). Every call is recorded, so tests
/// can assert that no network I/O happened.
///
/// # Examples
///
/// ```
/// use verdant_fetch::{Fetch, MockFetcher, Url, error::ErrorKind};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let fetcher = MockFetcher::default()
///     .with_body("https://img.example.com/a.png", b"png bytes".to_vec())
///     .with_failure("https://img.example.com/b.png", ErrorKind::Interrupted);
/// let a = fetcher.fetch(&Url::parse("https://img.example.com/a.png").unwrap()).await.unwrap();
/// assert_eq!(a.bytes, b"png bytes");
/// assert!(fetcher.fetch(&Url::parse("https://img.example.com/b.png").unwrap()).await.is_err());
/// assert_eq!(fetcher.requests().len(), 2);
/// # }
/// ```
#[derive(Default)]
pub struct MockFetcher {
    responses: HashMap<Url, std::result::Result<Vec<u8>, ErrorKind>>,
    requests: Mutex<Vec<Url>>,
}
impl MockFetcher {
    /// Panics if `reference` isn't a valid URL; test setup is expected to be
    /// correct.
    pub fn with_body(mut self, reference: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(Self::parse(reference), Ok(bytes.into()));
        self
    }

    pub fn with_failure(mut self, reference: &str, kind: ErrorKind) -> Self {
        self.responses.insert(Self::parse(reference), Err(kind));
        self
    }

    /// Every reference fetched so far, in call order.
    pub fn requests(&self) -> Vec<Url> {
        self.requests.lock().map(|guard| guard.clone()).unwrap_or_default()
    }

    fn parse(reference: &str) -> Url {
        match Url::parse(reference) {
            Ok(url) => url,
            Err(e) => panic!("MockFetcher: invalid reference {reference}: {e}"),
        }
    }
}

#[async_trait]
impl Fetch for MockFetcher {
    async fn fetch(&self, reference: &Url) -> Result<Fetched> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(reference.clone());
        }
        match self.responses.get(reference) {
            Some(Ok(bytes)) => Ok(Fetched { bytes: bytes.clone(), content_type: None }),
            Some(Err(kind)) => exn::bail!(kind.clone()),
            None => exn::bail!(ErrorKind::BadStatus(404)),
        }
    }
}
