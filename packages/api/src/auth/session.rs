//! # Session store: the signed-in state of the client
//!
//! [`SessionStore`] holds the current bearer token and mirrors it into durable
//! storage under [`store::AUTH_TOKEN_KEY`]. The in-memory [`Session`] is a cache
//! of that durable value: at startup [`initialize_auth`](SessionStore::initialize_auth)
//! re-derives it from storage.
//!
//! The store is constructed explicitly and handed to whoever needs it (the API
//! client, the navigation guard). Clones share one session, so a login performed
//! through one handle is visible through all of them.
//!
//! Only [`login`](SessionStore::login) and [`logout`](SessionStore::logout)
//! change the session. There is no expiry or refresh; a stale token shows up as an
//! authentication error on the next protected call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use store::{KeyValueStore, AUTH_TOKEN_KEY};
use tracing::{debug, warn};

/// Snapshot of the authentication state.
///
/// `is_authenticated()` is true exactly when a token is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    access_token: Option<String>,
}

impl Session {
    pub fn authenticated(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

/// Session state backed by a durable [`KeyValueStore`].
#[derive(Clone, Debug)]
pub struct SessionStore<S> {
    storage: S,
    session: Arc<Mutex<Session>>,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// A signed-out store over `storage`. Call
    /// [`initialize_auth`](Self::initialize_auth) to pick up a saved token.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            session: Arc::new(Mutex::new(Session::anonymous())),
        }
    }

    /// Persist `token` and mark the session authenticated.
    ///
    /// The token is not validated, but an empty token counts as no token and
    /// signs out instead. If the durable write fails the session is still
    /// updated in memory and the failure is logged.
    pub fn login(&self, token: &str) {
        if token.is_empty() {
            warn!("refusing empty session token");
            self.logout();
            return;
        }
        if let Err(e) = self.storage.set(AUTH_TOKEN_KEY, token) {
            warn!(error = %e, "failed to persist session token");
        }
        *self.lock() = Session::authenticated(token);
        debug!("session authenticated");
    }

    /// Drop the durable token and reset the session.
    pub fn logout(&self) {
        if let Err(e) = self.storage.remove(AUTH_TOKEN_KEY) {
            warn!(error = %e, "failed to remove session token");
        }
        *self.lock() = Session::anonymous();
        debug!("session cleared");
    }

    /// Restore the session from durable storage.
    ///
    /// Returns `true` and logs in with the saved token if one exists; otherwise
    /// returns `false` and leaves the session untouched.
    pub fn initialize_auth(&self) -> bool {
        let saved = match self.storage.get(AUTH_TOKEN_KEY) {
            Ok(saved) => saved,
            Err(e) => {
                warn!(error = %e, "failed to read session token");
                None
            }
        };
        match saved.filter(|token| !token.is_empty()) {
            Some(token) => {
                self.login(&token);
                true
            }
            None => false,
        }
    }

    /// Wipe the whole durable store (token, theme, everything) and sign out.
    pub fn clear_storage(&self) {
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "failed to clear client storage");
        }
        *self.lock() = Session::anonymous();
    }

    pub fn session(&self) -> Session {
        self.lock().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.lock().access_token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().is_authenticated()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
