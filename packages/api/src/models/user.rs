//! # User model for the directory
//!
//! Defines the two representations of a managed user:
//!
//! ## [`User`]
//!
//! A read-through copy of the server's record. The server owns it and assigns
//! the opaque `id`; the client never invents one. Wire names are camelCase
//! (`firstName`, `lastName`, `dateOfBirth`). Ids are accepted as JSON strings or
//! numbers and always held as a `String`.
//!
//! ## [`UserFormData`]
//!
//! What the create and edit forms submit: a [`User`] without its `id`. It is sent
//! as the raw JSON request body of `POST /api/users` and `PUT /api/users/{id}`.
//! [`UserFormData::validate`] runs the same field checks as the form did before
//! submitting, returning every failing field at once.
//!
//! ## [`UserStatus`]
//!
//! `ACTIVE` or `LOCKED` on the wire. The lowercase spellings are accepted on
//! input because older servers sent them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Account status of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    #[default]
    #[serde(alias = "active")]
    Active,
    #[serde(alias = "locked")]
    Locked,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Locked => "LOCKED",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(UserStatus::Active),
            "LOCKED" => Ok(UserStatus::Locked),
            _ => Err(format!("unknown status `{s}` (expected ACTIVE or LOCKED)")),
        }
    }
}

/// A user record as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    pub status: UserStatus,
    pub date_of_birth: String,
}

impl User {
    /// "First Last", or just the first name when there is no last name.
    pub fn display_name(&self) -> String {
        match self.last_name.as_deref().filter(|s| !s.is_empty()) {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }

    /// The editable fields of this user, as the edit form starts out.
    pub fn to_form_data(&self) -> UserFormData {
        UserFormData {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            status: self.status,
            date_of_birth: self.date_of_birth.clone(),
        }
    }
}

/// Payload of the create and update forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFormData {
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    pub status: UserStatus,
    pub date_of_birth: String,
}

/// One failed form check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    /// Wire name of the offending field.
    pub field: &'static str,
    pub message: &'static str,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl UserFormData {
    /// Check the form the way the UI does before submitting.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.first_name.trim().is_empty() {
            errors.push(FieldError {
                field: "firstName",
                message: "First name is required",
            });
        }

        if self.email.is_empty() {
            errors.push(FieldError {
                field: "email",
                message: "Email is required",
            });
        } else if !is_valid_email(&self.email) {
            errors.push(FieldError {
                field: "email",
                message: "Invalid email address",
            });
        }

        if !is_iso_date(&self.date_of_birth) {
            errors.push(FieldError {
                field: "dateOfBirth",
                message: "Date must be in YYYY-MM-DD format",
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

/// `^\d{4}-\d{2}-\d{2}$`
fn is_iso_date(date: &str) -> bool {
    date.len() == 10
        && date.char_indices().all(|(i, c)| match i {
            4 | 7 => c == '-',
            _ => c.is_ascii_digit(),
        })
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
