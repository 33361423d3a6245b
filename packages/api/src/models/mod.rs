//! Wire models for the user-management API.

mod auth;
mod user;

use serde::{Deserialize, Serialize};

pub use auth::{LoginCredentials, LoginResult};
pub use user::{FieldError, User, UserFormData, UserStatus};

/// Body of `GET /api/users`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

/// Body of the single-user endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: User,
}
