//! Login request and response bodies.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Email and password posted to `/api/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Token issued by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub access_token: String,
    /// Token lifetime in seconds. Sent as a number or a numeric string.
    #[serde(deserialize_with = "seconds_from_number_or_string")]
    pub expires_in: u64,
}

fn seconds_from_number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawSeconds {
        Number(u64),
        Text(String),
    }

    match RawSeconds::deserialize(deserializer)? {
        RawSeconds::Number(n) => Ok(n),
        RawSeconds::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
