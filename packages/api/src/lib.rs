//! # API crate: session and REST access for the user-management client
//!
//! This crate is the backbone of the client. Every front end (the `usradm` CLI,
//! a browser build) reaches the server only through the [`ApiClient`] defined
//! here, authenticated by the [`SessionStore`] it is handed.
//!
//! ## Modules
//!
//! | Module | Feature gate | Purpose |
//! |--------|-------------|---------|
//! | [`auth`] | none | [`Session`] snapshot and the durable-storage-backed [`SessionStore`] |
//! | [`client`] | none | [`ApiClient`]: request construction, envelope unwrapping, error normalization, read retries |
//! | [`config`] | none | [`ApiConfig`] resolved from `usradm.toml` and `USRADM_*` environment overrides |
//! | [`envelope`] | none | Nested (`result.data`) / flat success bodies and error message lookup |
//! | [`error`] | none | The closed [`ApiError`] taxonomy |
//! | [`models`] | none | Wire models: [`User`], [`UserFormData`], login bodies |
//! | [`transport`] | none | The [`Transport`] seam and its `reqwest` implementation |
//! | `testing` | `test-support` | A scripted in-memory transport for tests |
//!
//! ## REST contract
//!
//! | Operation | Method | Path | Auth |
//! |-----------|--------|------|------|
//! | Login | `POST` | `/api/login` | none |
//! | List users | `GET` | `/api/users[?search=term]` | Bearer |
//! | Get user | `GET` | `/api/users/{id}` | Bearer |
//! | Create user | `POST` | `/api/users` | Bearer |
//! | Update user | `PUT` | `/api/users/{id}` | Bearer |
//! | Delete user | `DELETE` | `/api/users/{id}` | Bearer |

pub mod auth;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod models;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use auth::{Session, SessionStore};
pub use client::ApiClient;
pub use config::{ApiConfig, EnvError};
pub use error::{ApiError, ErrorKind};
pub use models::{
    FieldError, LoginCredentials, LoginResult, User, UserFormData, UserResponse, UserStatus,
    UsersResponse,
};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport, TransportError};
