//! Profile rows and the store they are read from.
//!
//! Every user has exactly one row in `profiles`, created outside this
//! codebase. The Role Gate and the team listing only ever read them.

use crate::error::StoreError;
use crate::role::Role;
use crate::session::Session;
use ataraxia_core::UserId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rootcause::prelude::Report;
use serde::{Deserialize, Deserializer, Serialize};

/// A row of the `profiles` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default, deserialize_with = "nullable_role")]
    role: Role,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

/// Rows created before the role column existed hold `null`.
fn nullable_role<'de, D>(deserializer: D) -> Result<Role, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(Role::from)
        .unwrap_or_default())
}

impl Profile {
    /// Creates a profile without a creation timestamp.
    #[must_use]
    pub fn new(id: UserId, email: Option<String>, full_name: Option<String>, role: Role) -> Self {
        Self {
            id,
            email,
            full_name,
            role,
            created_at: None,
        }
    }

    /// Sets the creation timestamp.
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Returns the profile id (same as the user id).
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the email address, if stored.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the full name, if stored.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    /// Name to show in listings.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => "Tanpa Nama",
        }
    }

    /// Returns the stored role.
    #[must_use]
    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Returns when the row was created, if known.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

/// Read access to the `profiles` table, on behalf of a signed-in user.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetches the profile with the given id.
    async fn find_profile(
        &self,
        session: &Session,
        id: UserId,
    ) -> Result<Option<Profile>, Report<StoreError>>;

    /// Lists every profile, newest first.
    async fn list_profiles(&self, session: &Session) -> Result<Vec<Profile>, Report<StoreError>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn display_name_falls_back_when_missing_or_blank() {
        let id = UserId::from_uuid(Uuid::from_u128(1));
        let unnamed = Profile::new(id, None, None, Role::Partner);
        assert_eq!(unnamed.display_name(), "Tanpa Nama");

        let blank = Profile::new(id, None, Some("  ".to_string()), Role::Partner);
        assert_eq!(blank.display_name(), "Tanpa Nama");

        let named = Profile::new(id, None, Some("Raka".to_string()), Role::Partner);
        assert_eq!(named.display_name(), "Raka");
    }

    #[test]
    fn deserializes_row_with_null_role_as_partner() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000009",
            "email": "a@b.com",
            "full_name": null,
            "role": null,
            "created_at": "2025-01-05T08:30:00+00:00"
        }"#;
        let profile: Profile = serde_json::from_str(json).expect("deserialize");
        assert_eq!(profile.role(), &Role::Partner);
        assert_eq!(profile.display_name(), "Tanpa Nama");

        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000009",
            "email": "a@b.com",
            "created_at": "2025-01-05T08:30:00+00:00"
        }"#;
        let profile: Profile = serde_json::from_str(json).expect("deserialize");
        assert_eq!(profile.role(), &Role::Partner);
        assert!(profile.created_at().is_some());
    }

    #[test]
    fn deserializes_superadmin_row() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000001",
            "email": "owner@ataraxia.id",
            "full_name": "Owner",
            "role": "superadmin"
        }"#;
        let profile: Profile = serde_json::from_str(json).expect("deserialize");
        assert!(profile.role().is_superadmin());
        assert_eq!(profile.display_name(), "Owner");
    }
}
