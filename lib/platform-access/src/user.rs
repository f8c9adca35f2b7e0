//! User identity as reported by the hosted auth service.
//!
//! Users are created by invitation. This codebase never mutates them apart
//! from setting a password.

use ataraxia_core::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated user of the back office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier issued by the auth service.
    id: UserId,
    /// Email address, if the service reports one.
    #[serde(default)]
    email: Option<String>,
    /// When the user was invited.
    #[serde(default)]
    invited_at: Option<DateTime<Utc>>,
    /// When the user last signed in.
    #[serde(default)]
    last_sign_in_at: Option<DateTime<Utc>>,
}

impl User {
    /// Creates a user with just an id and email.
    #[must_use]
    pub fn new(id: UserId, email: Option<String>) -> Self {
        Self {
            id,
            email,
            invited_at: None,
            last_sign_in_at: None,
        }
    }

    /// Returns the user's id.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the user's email address, if available.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns when the user was invited, if known.
    #[must_use]
    pub fn invited_at(&self) -> Option<DateTime<Utc>> {
        self.invited_at
    }

    /// Returns when the user last signed in, if known.
    #[must_use]
    pub fn last_sign_in_at(&self) -> Option<DateTime<Utc>> {
        self.last_sign_in_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_auth_service_payload_ignoring_extra_fields() {
        let json = r#"{
            "id": "6f1c2a8e-3b4d-4e5f-9a0b-1c2d3e4f5a6b",
            "aud": "authenticated",
            "role": "authenticated",
            "email": "partner@ataraxia.id",
            "invited_at": "2025-03-01T10:00:00Z",
            "app_metadata": {"provider": "email"}
        }"#;

        let user: User = serde_json::from_str(json).expect("deserialize");
        assert_eq!(user.email(), Some("partner@ataraxia.id"));
        assert!(user.invited_at().is_some());
        assert!(user.last_sign_in_at().is_none());
    }

    #[test]
    fn new_user_has_no_timestamps() {
        let id: UserId = "6f1c2a8e-3b4d-4e5f-9a0b-1c2d3e4f5a6b".parse().expect("id");
        let user = User::new(id, None);
        assert_eq!(user.id(), id);
        assert!(user.email().is_none());
        assert!(user.invited_at().is_none());
    }
}
