//! API client settings, from `usradm.toml` plus environment overrides.
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `USRADM_API_URL` | `api.base_url` |
//! | `USRADM_TIMEOUT_SECS` | `api.timeout_secs` |
//! | `USRADM_READ_RETRIES` | `api.read_retries` |

use std::time::Duration;

use store::ClientConfig;
use thiserror::Error;

pub const API_URL_VAR: &str = "USRADM_API_URL";
pub const TIMEOUT_SECS_VAR: &str = "USRADM_TIMEOUT_SECS";
pub const READ_RETRIES_VAR: &str = "USRADM_READ_RETRIES";

/// An environment override that could not be parsed.
#[derive(Debug, Error)]
#[error("{name} must be a non-negative integer, got `{value}`")]
pub struct EnvError {
    pub name: &'static str,
    pub value: String,
}

/// Resolved settings for [`crate::ApiClient`] and its transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub read_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_client_config(&ClientConfig::default())
    }
}

impl ApiConfig {
    pub fn from_client_config(config: &ClientConfig) -> Self {
        Self {
            base_url: config.api.base_url.clone(),
            timeout: Duration::from_secs(config.api.timeout_secs),
            read_retries: config.api.read_retries,
        }
    }

    /// Apply `USRADM_*` overrides (after loading `.env`) on top of `config`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env(config: &ClientConfig) -> Result<Self, EnvError> {
        dotenvy::dotenv().ok();
        Self::with_overrides(config, |name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary lookup.
    pub fn with_overrides(
        config: &ClientConfig,
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, EnvError> {
        let mut resolved = Self::from_client_config(config);

        if let Some(url) = lookup(API_URL_VAR).filter(|v| !v.trim().is_empty()) {
            resolved.base_url = url.trim().to_string();
        }
        if let Some(secs) = parse_override(&lookup, TIMEOUT_SECS_VAR)? {
            resolved.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = parse_override(&lookup, READ_RETRIES_VAR)? {
            resolved.read_retries = u32::try_from(retries).map_err(|_| EnvError {
                name: READ_RETRIES_VAR,
                value: retries.to_string(),
            })?;
        }

        Ok(resolved)
    }
}

fn parse_override(
    lookup: &impl Fn(&'static str) -> Option<String>,
    name: &'static str,
) -> Result<Option<u64>, EnvError> {
    let Some(value) = lookup(name) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| EnvError { name, value })
}
