//! User account model.
//!
//! # Invariants
//! - `email` is unique across users (enforced by the store).
//! - The password never lives on `User`; only its hash is persisted, in a
//!   credential row owned by the user.

use super::{require_email, require_text, EntityId, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Student,
    Instructor,
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Instructor => "instructor",
            Self::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "student" => Some(Self::Student),
            "instructor" => Some(Self::Instructor),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Persisted user row (never includes credentials).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
    /// Set by the store at insert time.
    pub created_at: DateTime<Utc>,
}

/// Registration input. `password` is hashed before it reaches the store.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("firstName", &self.first_name)?;
        require_text("lastName", &self.last_name)?;
        require_email(&self.email)?;
        if self.password.is_empty() {
            return Err(ValidationError::EmptyPassword);
        }
        Ok(())
    }
}
