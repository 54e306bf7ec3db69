use crate::{AcquisitionRequest, ImageKind, Role};
use derive_more::Display;
use serde::{Serialize, Serializer};
use std::fmt::{Display as FmtDisplay, Formatter, Result as FmtResult};
use std::path::PathBuf;
use url::Url;
use verdant_optimize::Dimensions;
use verdant_storage::FileInfo;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    #[display("pending")]
    Pending,
    #[display("downloaded")]
    Downloaded,
    #[display("fallback")]
    Fallback,
}

/// The pipeline stage an acquisition gave up at.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[display("fetch")]
    Fetch,
    #[display("optimize")]
    Optimize,
    #[display("store")]
    Store,
}

/// Why a slot fell back to its remote reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackReason {
    pub stage: Stage,
    pub message: String,
}
impl FallbackReason {
    pub fn new(stage: Stage, cause: &dyn FmtDisplay) -> Self {
        Self {
            stage,
            message: cause.to_string(),
        }
    }
}
impl FmtDisplay for FallbackReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} failed: {}", self.stage, self.message)
    }
}

/// A durably persisted, optimized image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file: FileInfo,
    pub dimensions: Dimensions,
}

/// What the presentation layer should point at: the local artifact when there
/// is one, otherwise the original remote image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayReference {
    /// Relative to the storage root.
    Local(PathBuf),
    Remote(Url),
}
impl FmtDisplay for DisplayReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            // Storage paths are always rendered with forward slashes.
            Self::Local(path) => {
                let parts: Vec<_> = path.iter().map(|part| part.to_string_lossy()).collect();
                write!(f, "{}", parts.join("/"))
            },
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}
impl Serialize for DisplayReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SlotState {
    Pending,
    Downloaded(Artifact),
    Fallback(FallbackReason),
}

/// One desired image for one owner, and how far acquiring it got.
///
/// A slot only ever reports [`DownloadStatus::Downloaded`] while holding an
/// [`Artifact`]; the remote reference is kept in every state so there is
/// always something to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSlot {
    owner_id: String,
    request: AcquisitionRequest,
    state: SlotState,
}
impl MediaSlot {
    pub fn new(owner_id: impl Into<String>, request: AcquisitionRequest) -> Self {
        Self {
            owner_id: owner_id.into(),
            request,
            state: SlotState::Pending,
        }
    }

    pub(crate) fn downloaded(self, artifact: Artifact) -> Self {
        Self {
            state: SlotState::Downloaded(artifact),
            ..self
        }
    }

    pub(crate) fn fallback(self, reason: FallbackReason) -> Self {
        Self {
            state: SlotState::Fallback(reason),
            ..self
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn role(&self) -> Role {
        self.request.role
    }

    pub fn order(&self) -> u32 {
        self.request.order
    }

    pub fn remote_reference(&self) -> &Url {
        &self.request.remote_reference
    }

    pub fn caption(&self) -> &str {
        &self.request.caption
    }

    pub fn alt_text(&self) -> &str {
        &self.request.alt_text
    }

    pub fn kind(&self) -> Option<ImageKind> {
        self.request.kind
    }

    pub fn request(&self) -> &AcquisitionRequest {
        &self.request
    }

    pub fn into_request(self) -> AcquisitionRequest {
        self.request
    }

    pub fn download_status(&self) -> DownloadStatus {
        match self.state {
            SlotState::Pending => DownloadStatus::Pending,
            SlotState::Downloaded(_) => DownloadStatus::Downloaded,
            SlotState::Fallback(_) => DownloadStatus::Fallback,
        }
    }

    pub fn local_artifact(&self) -> Option<&Artifact> {
        match &self.state {
            SlotState::Downloaded(artifact) => Some(artifact),
            _ => None,
        }
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match &self.state {
            SlotState::Fallback(reason) => Some(reason),
            _ => None,
        }
    }

    /// Never fails: the local path once downloaded, the remote reference in
    /// every other state.
    pub fn display_reference(&self) -> DisplayReference {
        match &self.state {
            SlotState::Downloaded(artifact) => DisplayReference::Local(artifact.file.path.clone()),
            SlotState::Pending | SlotState::Fallback(_) => {
                DisplayReference::Remote(self.request.remote_reference.clone())
            },
        }
    }
}
