//! # Browser `localStorage` store: web-side persistence
//!
//! [`LocalStorage`] is the [`KeyValueStore`] used on the **web platform**. It maps
//! each key straight onto `window.localStorage`, so a token written by this crate
//! is the same `"auth-token"` entry a page script would see.
//!
//! ## Handle management
//!
//! `LocalStorage` is a zero-size struct that looks up `window.localStorage` on
//! every operation. `web_sys::Storage` is not `Send`, and the lookup is a cheap
//! property read.
//!
//! ## Error handling
//!
//! A missing `window` (workers) or a browser that refuses storage access (private
//! mode, disabled cookies) surfaces as [`StoreError::Unavailable`]. Quota errors on
//! `setItem` are reported the same way.

use web_sys::Storage;

use crate::kv::{KeyValueStore, StoreError};

/// `window.localStorage`-backed KeyValueStore.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }

    fn storage(&self) -> Result<Storage, StoreError> {
        let window = web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("no window object".to_string()))?;
        window
            .local_storage()
            .map_err(|e| StoreError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| StoreError::Unavailable("localStorage disabled".to_string()))
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage()?
            .get_item(key)
            .map_err(|e| StoreError::Unavailable(format!("{e:?}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| StoreError::Unavailable(format!("{e:?}")))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| StoreError::Unavailable(format!("{e:?}")))
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.storage()?
            .clear()
            .map_err(|e| StoreError::Unavailable(format!("{e:?}")))
    }
}
