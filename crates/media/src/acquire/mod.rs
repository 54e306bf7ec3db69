//! Fetch, optimize and store the images requested for an owner.
//!
//! [`Acquirer::acquire`] runs one request through the pipeline and always
//! settles the resulting [`MediaSlot`] as downloaded or fallback. Network,
//! decoding and storage failures are recorded on the slot; only caller defects
//! (see [`ErrorKind`]) are returned as errors.
//!
//! Batches go through [`Acquirer::acquire_stream`] or
//! [`Acquirer::acquire_batch`], which validate every request up front and then
//! acquire slots concurrently with a bounded number in flight.

mod stream;

pub use self::stream::AcquireEvent;
use crate::error::{ErrorKind, Result};
use crate::path::{resolve, validate_slug};
use crate::slot::{Artifact, FallbackReason, MediaSlot, Stage};
use crate::{AcquisitionRequest, Owner};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::instrument;
use url::Url;
use verdant_fetch::FetchHandle;
use verdant_optimize::{OptimizeOptions, optimize};
use verdant_storage::BackendHandle;

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_MAX_SLOTS: usize = 6;

/// Runs acquisition requests against a fetcher and a storage backend.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use verdant_fetch::{FetchOptions, HttpFetcher, Url};
/// use verdant_media::{AcquisitionRequest, Acquirer, Owner, Role};
/// use verdant_storage::backend::LocalBackend;
///
/// # async fn example() {
/// let fetcher = Arc::new(HttpFetcher::new(FetchOptions::default()).unwrap());
/// let backend = Arc::new(LocalBackend::new("media", "/srv/media").unwrap());
/// let acquirer = Acquirer::new(fetcher, backend);
///
/// let owner = Owner::new("42", "fiddle-leaf-fig-care");
/// let reference = Url::parse("https://images.example.com/fig.jpg").unwrap();
/// let slot = acquirer.acquire(&owner, AcquisitionRequest::new(reference, Role::Thumbnail)).await.unwrap();
/// println!("{} -> {}", slot.download_status(), slot.display_reference());
/// # }
/// ```
#[derive(Clone)]
pub struct Acquirer {
    fetcher: FetchHandle,
    backend: BackendHandle,
    optimize: OptimizeOptions,
    concurrency: usize,
    max_slots: usize,
}
impl Acquirer {
    pub fn new(fetcher: FetchHandle, backend: BackendHandle) -> Self {
        Self {
            fetcher,
            backend,
            optimize: OptimizeOptions::default(),
            concurrency: DEFAULT_CONCURRENCY,
            max_slots: DEFAULT_MAX_SLOTS,
        }
    }

    pub fn with_optimize_options(mut self, options: OptimizeOptions) -> Self {
        self.optimize = options;
        self
    }

    /// Maximum slots in flight at once within a batch. Clamped to at least 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_max_slots(mut self, max_slots: usize) -> Self {
        self.max_slots = max_slots;
        self
    }

    /// Acquire a single slot.
    ///
    /// Each stage is attempted once; the first failure settles the slot as
    /// [`Fallback`](crate::DownloadStatus::Fallback) and nothing is written.
    /// Running it again for the same request overwrites the same path.
    ///
    /// # Errors
    /// [`InvalidSlug`](ErrorKind::InvalidSlug) before any I/O.
    pub async fn acquire(&self, owner: &Owner, request: AcquisitionRequest) -> Result<MediaSlot> {
        let path = resolve(&owner.slug, request.role, request.order)?;
        Ok(self.acquire_resolved(owner, path, request).await)
    }

    /// Retry a slot that fell back. Downloaded slots are returned untouched.
    ///
    /// # Errors
    /// [`OwnerMismatch`](ErrorKind::OwnerMismatch) if `slot` wasn't acquired
    /// for `owner`, or [`InvalidSlug`](ErrorKind::InvalidSlug).
    pub async fn reacquire(&self, owner: &Owner, slot: MediaSlot) -> Result<MediaSlot> {
        if slot.owner_id() != owner.id {
            exn::bail!(ErrorKind::OwnerMismatch {
                owner: owner.id.clone(),
                slot_owner: slot.owner_id().to_string(),
            });
        }
        if slot.local_artifact().is_some() {
            return Ok(slot);
        }
        self.acquire(owner, slot.into_request()).await
    }

    #[instrument(
        skip(self, owner, request),
        fields(owner = %owner.id, role = %request.role, order = request.order, path = %path.display())
    )]
    async fn acquire_resolved(&self, owner: &Owner, path: PathBuf, request: AcquisitionRequest) -> MediaSlot {
        let outcome = self.run_pipeline(&path, &request.remote_reference).await;
        let slot = MediaSlot::new(owner.id.clone(), request);
        match outcome {
            Ok(artifact) => {
                tracing::info!(
                    bytes = artifact.file.size,
                    dimensions = %artifact.dimensions,
                    "Media slot downloaded"
                );
                slot.downloaded(artifact)
            },
            Err(reason) => {
                tracing::warn!(
                    url = %slot.remote_reference(),
                    stage = %reason.stage,
                    reason = %reason.message,
                    "Media slot fell back to remote reference"
                );
                slot.fallback(reason)
            },
        }
    }

    async fn run_pipeline(&self, path: &Path, reference: &Url) -> std::result::Result<Artifact, FallbackReason> {
        let fetched = self.fetcher.fetch(reference).await.map_err(|e| FallbackReason::new(Stage::Fetch, &*e))?;

        let options = self.optimize;
        let optimized = tokio::task::spawn_blocking(move || optimize(&fetched.bytes, &options))
            .await
            .map_err(|e| FallbackReason::new(Stage::Optimize, &e))?
            .map_err(|e| FallbackReason::new(Stage::Optimize, &*e))?;

        let file = self
            .backend
            .write(path, &optimized.bytes)
            .await
            .map_err(|e| FallbackReason::new(Stage::Store, &*e))?;
        Ok(Artifact {
            file,
            dimensions: optimized.dimensions,
        })
    }

    /// Validate a whole batch, returning each request with its storage path
    /// in `(role, order)` sequence.
    fn plan(&self, owner: &Owner, mut requests: Vec<AcquisitionRequest>) -> Result<Vec<(PathBuf, AcquisitionRequest)>> {
        requests.sort_by_key(|request| (request.role, request.order));
        let paths = resolve_batch(owner, &requests, self.max_slots)?;
        Ok(paths.into_iter().zip(requests).collect())
    }
}

/// Check a batch the way [`Acquirer::acquire_batch`] does, without needing an
/// acquirer and without touching the network or disk.
///
/// Lets callers reject a batch before they set up any storage for it.
///
/// # Errors
/// [`InvalidSlug`](ErrorKind::InvalidSlug),
/// [`TooManySlots`](ErrorKind::TooManySlots) or
/// [`DuplicateSlot`](ErrorKind::DuplicateSlot).
pub fn validate_batch(owner: &Owner, requests: &[AcquisitionRequest], max_slots: usize) -> Result<()> {
    resolve_batch(owner, requests, max_slots).map(drop)
}

fn resolve_batch(owner: &Owner, requests: &[AcquisitionRequest], max_slots: usize) -> Result<Vec<PathBuf>> {
    validate_slug(&owner.slug)?;
    if requests.len() > max_slots {
        exn::bail!(ErrorKind::TooManySlots {
            requested: requests.len(),
            max: max_slots,
        });
    }
    let mut seen = HashSet::with_capacity(requests.len());
    let mut paths = Vec::with_capacity(requests.len());
    for request in requests {
        let path = resolve(&owner.slug, request.role, request.order)?;
        if !seen.insert(path.clone()) {
            exn::bail!(ErrorKind::DuplicateSlot(path));
        }
        paths.push(path);
    }
    Ok(paths)
}
