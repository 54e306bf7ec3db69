use crate::error::{ErrorKind, Result};
use crate::{Fetch, Fetched};
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::instrument;
use url::Url;

/// Pause before retry `n` is `n` times this.
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Tunables for [`HttpFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Wall-clock budget per attempt, connection and body included.
    pub timeout: Duration,
    /// Largest body accepted, in bytes.
    pub max_bytes: u64,
    /// Extra attempts after a retryable failure.
    pub retries: u32,
    pub user_agent: String,
}
impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_bytes: 20 * 1024 * 1024,
            retries: 1,
            user_agent: concat!("verdant/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// HTTP(S) implementation of [`Fetch`] built on [`reqwest`].
///
/// # Examples
///
/// ```no_run
/// use verdant_fetch::{Fetch, FetchOptions, HttpFetcher, Url};
///
/// # async fn example() -> verdant_fetch::error::Result<()> {
/// let fetcher = HttpFetcher::new(FetchOptions::default())?;
/// let reference = Url::parse("https://images.example.com/monstera.jpg").unwrap();
/// let fetched = fetcher.fetch(&reference).await?;
/// println!("{} bytes ({:?})", fetched.bytes.len(), fetched.content_type);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    options: FetchOptions,
}
impl HttpFetcher {
    pub fn new(options: FetchOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(options.user_agent.clone())
            .connect_timeout(options.timeout)
            .build()
            .or_raise(|| ErrorKind::Client)?;
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// A single attempt with an explicit wall-clock budget. No retries.
    #[instrument(skip(self, reference), fields(url = %reference))]
    pub async fn fetch_with_timeout(&self, reference: &Url, timeout: Duration) -> Result<Fetched> {
        if !matches!(reference.scheme(), "http" | "https") {
            exn::bail!(ErrorKind::InvalidReference(reference.to_string()));
        }
        match tokio::time::timeout(timeout, self.fetch_once(reference, timeout)).await {
            Ok(result) => result,
            Err(_elapsed) => exn::bail!(ErrorKind::Timeout(timeout)),
        }
    }

    async fn fetch_once(&self, reference: &Url, timeout: Duration) -> Result<Fetched> {
        let lift = |err: reqwest::Error| {
            let kind = classify(&err, timeout);
            exn::Exn::from(err).raise(kind)
        };
        let ceiling = self.options.max_bytes;

        let mut response = self.client.get(reference.clone()).send().await.map_err(lift)?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::BadStatus(status.as_u16()));
        }
        let declared = response.content_length();
        if let Some(length) = declared
            && length > ceiling
        {
            exn::bail!(ErrorKind::TooLarge(ceiling));
        }
        let content_type =
            response.headers().get(CONTENT_TYPE).and_then(|value| value.to_str().ok()).map(str::to_owned);

        // Infallible in practice: the ceiling is far below usize::MAX.
        let capacity = usize::try_from(declared.unwrap_or(0).min(ceiling)).unwrap_or(0);
        let mut bytes = Vec::with_capacity(capacity);
        while let Some(chunk) = response.chunk().await.map_err(lift)? {
            if (bytes.len() + chunk.len()) as u64 > ceiling {
                exn::bail!(ErrorKind::TooLarge(ceiling));
            }
            bytes.extend_from_slice(&chunk);
        }
        tracing::debug!(bytes = bytes.len(), content_type = content_type.as_deref(), "Fetched remote reference");
        Ok(Fetched { bytes, content_type })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, reference: &Url) -> Result<Fetched> {
        let mut attempt = 0;
        loop {
            match self.fetch_with_timeout(reference, self.options.timeout).await {
                Err(err) if err.is_retryable() && attempt < self.options.retries => {
                    attempt += 1;
                    let kind: &ErrorKind = &err;
                    tracing::debug!(url = %reference, attempt, error = %kind, "Retrying fetch");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                },
                result => return result,
            }
        }
    }
}

fn classify(err: &reqwest::Error, timeout: Duration) -> ErrorKind {
    if err.is_timeout() {
        ErrorKind::Timeout(timeout)
    } else if err.is_connect() {
        ErrorKind::Unreachable(err.to_string())
    } else if err.is_body() || err.is_decode() {
        ErrorKind::Interrupted
    } else if err.is_builder() {
        ErrorKind::InvalidReference(err.to_string())
    } else {
        ErrorKind::Unreachable(err.to_string())
    }
}
