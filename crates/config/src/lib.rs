//! Layered configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults ([`Config::default`]),
//! 2. `config.toml` in the platform config directory, if present
//!    (e.g. `~/.config/verdant/config.toml`),
//! 3. an explicit file passed by the caller (`.toml`, `.yaml`/`.yml` or `.json`),
//! 4. environment variables such as `VERDANT_FETCH__TIMEOUT_SECS=5`, where a
//!    double underscore separates the section from the key.
//!
//! ```toml
//! [storage]
//! root = "/srv/verdant/media"
//!
//! [fetch]
//! timeout_secs = 10
//! retries = 1
//!
//! [optimize]
//! max_width = 1200
//! max_height = 800
//! quality = 85
//!
//! [placeholders]
//! thumbnail = "https://static.example.com/placeholder-thumb.jpg"
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;
use verdant_fetch::FetchOptions;
use verdant_optimize::{Dimensions, OptimizeOptions};

const ENV_PREFIX: &str = "VERDANT_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub fetch: FetchConfig,
    pub optimize: OptimizeConfig,
    pub batch: BatchConfig,
    pub placeholders: PlaceholderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Absolute directory that owner directories are created under.
    pub root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per attempt.
    pub timeout_secs: u64,
    pub max_bytes: u64,
    pub retries: u32,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeConfig {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Slots acquired at the same time for one owner.
    pub concurrency: usize,
    pub max_slots: usize,
}

/// Shown when an owner has no slot at all for the role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderConfig {
    pub thumbnail: Option<Url>,
    pub featured: Option<Url>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Without a home directory there's no sensible default; the relative
        // path fails validation and asks for an explicit root.
        let root = project_dirs().map(|dirs| dirs.data_dir().join("media")).unwrap_or_else(|| PathBuf::from("media"));
        Self { root }
    }
}
impl Default for FetchConfig {
    fn default() -> Self {
        let defaults = FetchOptions::default();
        Self {
            timeout_secs: defaults.timeout.as_secs(),
            max_bytes: defaults.max_bytes,
            retries: defaults.retries,
            user_agent: defaults.user_agent,
        }
    }
}
impl Default for OptimizeConfig {
    fn default() -> Self {
        let defaults = OptimizeOptions::default();
        Self {
            max_width: defaults.max_dimensions.width,
            max_height: defaults.max_dimensions.height,
            quality: defaults.quality,
        }
    }
}
impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: verdant_media::DEFAULT_CONCURRENCY,
            max_slots: verdant_media::DEFAULT_MAX_SLOTS,
        }
    }
}

impl FetchConfig {
    pub fn options(&self) -> FetchOptions {
        FetchOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            max_bytes: self.max_bytes,
            retries: self.retries,
            user_agent: self.user_agent.clone(),
        }
    }
}
impl OptimizeConfig {
    pub fn options(&self) -> OptimizeOptions {
        OptimizeOptions {
            max_dimensions: Dimensions::new(self.max_width, self.max_height),
            quality: self.quality,
        }
    }
}

impl Config {
    /// Load from every source and validate the result.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_from(Self::platform_file(), explicit)
    }

    /// Where the platform config file is looked for, whether or not it exists.
    pub fn platform_file() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn load_from(platform: Option<PathBuf>, explicit: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(platform) = platform.filter(|path| path.is_file()) {
            tracing::debug!(path = %platform.display(), "Loading platform config file");
            figment = figment.merge(Toml::file(platform));
        }
        if let Some(explicit) = explicit {
            figment = merge_explicit(figment, explicit)?;
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| exn::Exn::from(ErrorKind::Invalid(message.to_string()));
        if !self.storage.root.is_absolute() {
            return Err(invalid("storage.root must be an absolute path"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(invalid("fetch.timeout_secs must be greater than zero"));
        }
        if self.fetch.max_bytes == 0 {
            return Err(invalid("fetch.max_bytes must be greater than zero"));
        }
        if self.optimize.max_width == 0 || self.optimize.max_height == 0 {
            return Err(invalid("optimize.max_width and optimize.max_height must be greater than zero"));
        }
        if !(1..=100).contains(&self.optimize.quality) {
            return Err(invalid("optimize.quality must be between 1 and 100"));
        }
        if self.batch.concurrency == 0 {
            return Err(invalid("batch.concurrency must be greater than zero"));
        }
        if self.batch.max_slots == 0 {
            return Err(invalid("batch.max_slots must be greater than zero"));
        }
        Ok(())
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "verdant")
}

fn merge_explicit(figment: Figment, path: &Path) -> Result<Figment> {
    // File providers search parent directories for relative paths.
    let path = std::path::absolute(path).or_raise(|| ErrorKind::NotFound(path.to_path_buf()))?;
    if !path.is_file() {
        exn::bail!(ErrorKind::NotFound(path));
    }
    tracing::debug!(path = %path.display(), "Loading config file");
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path)),
    })
}
