//! # Filesystem-backed key-value store
//!
//! [`FileStore`] is a [`KeyValueStore`] implementation that keeps each key in its
//! own file. It is used by native front ends (the `usradm` CLI) to retain the
//! session token and theme preference across runs, the way a browser keeps them
//! in `localStorage`.
//!
//! ## Layout
//!
//! ```text
//! <base_dir>/
//! ├── auth-token         # raw token string
//! └── theme              # "dark" | "light"
//! ```
//!
//! ## Platform data directories
//!
//! [`FileStore::default_dir`] resolves a platform-appropriate base via
//! [`dirs::data_dir()`]:
//!
//! | Platform | Path |
//! |----------|------|
//! | macOS | `~/Library/Application Support/usradm/` |
//! | Linux | `~/.local/share/usradm/` |
//! | Windows | `C:\Users\<user>\AppData\Roaming\usradm\` |

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::kv::{KeyValueStore, StoreError};

/// Filesystem-backed KeyValueStore for native persistence.
#[derive(Clone, Debug)]
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    /// `<data_dir>/usradm`, falling back to `./usradm` when the platform has no
    /// data directory.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("usradm")
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\']);
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.base.join(key))
    }
}

fn io_error(key: &str, source: std::io::Error) -> StoreError {
    StoreError::Io {
        key: key.to_string(),
        source,
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.key_path(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        std::fs::create_dir_all(&self.base).map_err(|e| io_error(key, e))?;
        std::fs::write(&path, value).map_err(|e| io_error(key, e))?;
        // Values include the bearer token: owner-only access
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| io_error(key, e))?;
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.key_path(key)?) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(io_error(key, e)),
            _ => Ok(()),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_dir_all(&self.base) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(io_error("*", e)),
            _ => Ok(()),
        }
    }
}
