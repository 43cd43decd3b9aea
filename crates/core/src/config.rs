//! TOML-based configuration for gitavatar.
//!
//! Every table and field has a default, so an empty file (or no file at
//! all) is a valid configuration. Command-line flags override file values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ConfigError;
use crate::gravatar::{CollisionPolicy, FetchOptions};
use crate::identity::IdentityMatch;

/// Largest image edge, in pixels, that Gravatar will serve.
pub const MAX_IMAGE_SIZE: u32 = 2048;

/// Content ratings Gravatar understands.
const RATINGS: &[&str] = &["g", "pg", "r", "x"];

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Repository to read committers from.
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Where images are written.
    #[serde(default)]
    pub output: OutputConfig,

    /// Image service settings.
    #[serde(default)]
    pub gravatar: GravatarConfig,

    /// Run behaviour.
    #[serde(default)]
    pub fetch: FetchConfig,
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Repository settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Path to the Git working copy (default `.`).
    #[serde(default = "default_repository_path")]
    pub path: PathBuf,
}

fn default_repository_path() -> PathBuf {
    PathBuf::from(".")
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            path: default_repository_path(),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving one `<name>.png` per committer (default `./gravatars`).
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,

    /// File naming when two committers share a display name.
    #[serde(default)]
    pub collision: CollisionPolicy,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./gravatars")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            collision: CollisionPolicy::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Gravatar
// ---------------------------------------------------------------------------

/// Image service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GravatarConfig {
    /// Base URL images are requested under (default `https://www.gravatar.com/avatar`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Image edge in pixels (default 90).
    #[serde(default = "default_size")]
    pub size: u32,

    /// Maximum content rating (default `g`).
    #[serde(default = "default_rating")]
    pub rating: String,

    /// Per-request timeout in seconds. Unset means no timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "https://www.gravatar.com/avatar".into()
}
fn default_size() -> u32 {
    90
}
fn default_rating() -> String {
    "g".into()
}

impl Default for GravatarConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            size: default_size(),
            rating: default_rating(),
            timeout_secs: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Fetch behaviour
// ---------------------------------------------------------------------------

/// Run behaviour settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum simultaneous requests; `0` means one task per committer at once.
    #[serde(default)]
    pub max_concurrent: usize,

    /// How log entries are merged into committers.
    #[serde(default)]
    pub identity_match: IdentityMatch,
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Validate that all values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repository.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "repository.path".into(),
                detail: "repository path must not be empty".into(),
            });
        }
        if self.output.directory.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "output.directory".into(),
                detail: "output directory must not be empty".into(),
            });
        }
        let base = &self.gravatar.base_url;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "gravatar.base_url".into(),
                detail: "base URL must start with http:// or https://".into(),
            });
        }
        if self.gravatar.size == 0 || self.gravatar.size > MAX_IMAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "gravatar.size".into(),
                detail: format!("size must be between 1 and {}", MAX_IMAGE_SIZE),
            });
        }
        if !RATINGS.contains(&self.gravatar.rating.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "gravatar.rating".into(),
                detail: format!("rating must be one of {}", RATINGS.join(", ")),
            });
        }
        if self.gravatar.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "gravatar.timeout_secs".into(),
                detail: "timeout must be > 0 when set".into(),
            });
        }
        Ok(())
    }

    /// Convenience: load and validate in one call.
    pub fn load_and_validate<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Orchestrator options derived from this configuration.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            max_concurrent: self.fetch.max_concurrent,
            collision: self.output.collision,
        }
    }
}
