//! # Error taxonomy of the API client
//!
//! Every [`crate::ApiClient`] operation returns its typed payload or exactly one
//! [`ApiError`]. The variant says what kind of failure it was; the message is the
//! server's own text when the error body had one, otherwise a fixed fallback for
//! the operation (`"Failed to fetch users"`, ...). `Display` prints the message
//! only, so it can go straight into a toast or banner.
//!
//! ## Status mapping
//!
//! | Response | Login | Reads by id | List | Create | Update | Delete |
//! |----------|-------|-------------|------|--------|--------|--------|
//! | 401 / 403 | `Authentication` | `Authentication` | `Authentication` | `Authentication` | `Authentication` | `Authentication` |
//! | 404 | `Authentication` | `NotFound` | `Fetch` | `Validation` | `NotFound` | `NotFound` |
//! | other 4xx | `Authentication` | `Fetch` | `Fetch` | `Validation` | `Validation` | `Fetch` |
//! | 5xx | `Authentication` | `Fetch` | `Fetch` | `Fetch` | `Fetch` | `Fetch` |
//! | transport failure | `Fetch` | `Fetch` | `Fetch` | `Fetch` | `Fetch` | `Fetch` |

use thiserror::Error;

/// Discriminant of [`ApiError`], for call sites that branch on the kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Authentication,
    Validation,
    NotFound,
    Fetch,
}

/// Failure of an API client operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Login rejected, or a protected call made without a valid token.
    #[error("{0}")]
    Authentication(String),
    /// The server refused the submitted user data.
    #[error("{0}")]
    Validation(String),
    /// No user with the requested id.
    #[error("{0}")]
    NotFound(String),
    /// Transport failure or any other unsuccessful response.
    #[error("{0}")]
    Fetch(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Authentication(_) => ErrorKind::Authentication,
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Fetch(_) => ErrorKind::Fetch,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Authentication(m)
            | ApiError::Validation(m)
            | ApiError::NotFound(m)
            | ApiError::Fetch(m) => m,
        }
    }

    pub fn is_authentication(&self) -> bool {
        self.kind() == ErrorKind::Authentication
    }

    /// Classify an unsuccessful HTTP status for `operation`.
    pub(crate) fn from_status(operation: Operation, status: u16, message: Option<String>) -> Self {
        let message = message.unwrap_or_else(|| operation.fallback_message().to_string());
        match (operation, status) {
            (Operation::Login, _) | (_, 401 | 403) => ApiError::Authentication(message),
            (Operation::GetUser | Operation::UpdateUser | Operation::DeleteUser, 404) => {
                ApiError::NotFound(message)
            }
            (Operation::CreateUser | Operation::UpdateUser, 400..=499) => {
                ApiError::Validation(message)
            }
            _ => ApiError::Fetch(message),
        }
    }

    /// The request never produced a response.
    pub(crate) fn transport(operation: Operation) -> Self {
        ApiError::Fetch(operation.fallback_message().to_string())
    }

    /// A success response whose body did not match the expected shape.
    pub(crate) fn decode(operation: Operation, error: &serde_json::Error) -> Self {
        ApiError::Fetch(format!(
            "{}: unexpected response body ({error})",
            operation.fallback_message()
        ))
    }

    /// A request body that could not be serialized; nothing was sent.
    pub(crate) fn encode(operation: Operation, error: &serde_json::Error) -> Self {
        ApiError::Fetch(format!(
            "{}: invalid request body ({error})",
            operation.fallback_message()
        ))
    }
}

/// The client operations, for error classification and log context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Login,
    ListUsers,
    GetUser,
    CreateUser,
    UpdateUser,
    DeleteUser,
}

impl Operation {
    pub(crate) fn fallback_message(&self) -> &'static str {
        match self {
            Operation::Login => "Failed to login",
            Operation::ListUsers => "Failed to fetch users",
            Operation::GetUser => "Failed to fetch user",
            Operation::CreateUser => "Failed to create user",
            Operation::UpdateUser => "Failed to update user",
            Operation::DeleteUser => "Failed to delete user",
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Operation::Login => "login",
            Operation::ListUsers => "list users",
            Operation::GetUser => "get user",
            Operation::CreateUser => "create user",
            Operation::UpdateUser => "update user",
            Operation::DeleteUser => "delete user",
        }
    }

    /// Idempotent reads may be retried; mutations and login never are.
    pub(crate) fn is_read(&self) -> bool {
        matches!(self, Operation::ListUsers | Operation::GetUser)
    }
}
