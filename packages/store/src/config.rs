//! # Client configuration: `usradm.toml`
//!
//! Defines the TOML configuration file read by client front ends at startup
//! (filename: [`ClientConfig::filename`] = `"usradm.toml"`). It tells the API
//! client where the server lives and tunes the directory view.
//!
//! ## Structure
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8080"   # scheme + host the /api paths hang off
//! timeout_secs = 30                    # per-request transport timeout
//! read_retries = 1                     # extra attempts for idempotent reads
//!
//! [directory]
//! search_debounce_ms = 300             # quiet period before a search fetch
//! ```
//!
//! ## Types
//!
//! | Struct | Purpose |
//! |--------|---------|
//! | [`ClientConfig`] | Top-level config. TOML (de)serialisation, file loading, the canonical filename. |
//! | [`ApiSection`] | Server location and transport tuning. |
//! | [`DirectorySection`] | Search debounce delay for the user directory. |
//!
//! Every field has a serde default so that a missing or partial file is
//! equivalent to the default configuration. Environment overrides are applied
//! on top of this by `api::ApiConfig`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration stored in `usradm.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub directory: DirectorySection,
}

/// Where the REST API lives and how requests are sent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiSection {
    /// Origin that `/api/...` paths are resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Transport timeout per request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra attempts for read requests after a transport failure or 5xx.
    #[serde(default = "default_read_retries")]
    pub read_retries: u32,
}

/// Directory view tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectorySection {
    /// Quiet period after the last keystroke before a search is sent.
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_read_retries() -> u32 {
    1
}

fn default_search_debounce_ms() -> u64 {
    300
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            read_retries: default_read_retries(),
        }
    }
}

impl Default for DirectorySection {
    fn default() -> Self {
        Self {
            search_debounce_ms: default_search_debounce_ms(),
        }
    }
}

impl ClientConfig {
    /// Create a config pointing at the given server origin.
    pub fn new(base_url: String) -> Self {
        Self {
            api: ApiSection {
                base_url,
                ..ApiSection::default()
            },
            directory: DirectorySection::default(),
        }
    }

    /// Builder method to set the number of read retries.
    pub fn with_read_retries(mut self, retries: u32) -> Self {
        self.api.read_retries = retries;
        self
    }

    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "usradm.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Read the config file at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::from_toml(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }
}
