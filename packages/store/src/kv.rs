//! # Key-value storage: the durable client storage abstraction
//!
//! Everything the client needs to survive a restart (the session token and the
//! theme preference) is a short string stored under a well-known key. This
//! module defines the [`KeyValueStore`] trait that every backend implements, the
//! shared [`StoreError`] type, and the key constants.
//!
//! ## Backends
//!
//! | Type | Platform | Persistence |
//! |------|----------|-------------|
//! | [`crate::MemoryStore`] | any | process lifetime only (tests, fallbacks) |
//! | [`crate::FileStore`] | native | one file per key under a base directory |
//! | `LocalStorage` | WASM + `web` feature | the browser's `window.localStorage` |
//!
//! ## Keys
//!
//! | Constant | Value | Contents |
//! |----------|-------|----------|
//! | [`AUTH_TOKEN_KEY`] | `"auth-token"` | bearer token of the signed-in user |
//! | [`THEME_KEY`] | `"theme"` | `"dark"` or `"light"` |

use thiserror::Error;

/// Durable key holding the session token.
pub const AUTH_TOKEN_KEY: &str = "auth-token";

/// Durable key holding the theme preference.
pub const THEME_KEY: &str = "theme";

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed for `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid storage key `{0}`")]
    InvalidKey(String),

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous string storage keyed by name.
///
/// Reads of a missing key return `Ok(None)`; removing a missing key is not an
/// error.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
    /// Drop every key held by this store.
    fn clear(&self) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}
