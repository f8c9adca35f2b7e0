//! Profile roles and the role check used in front of privileged pages.
//!
//! Roles live in the `role` column of the `profiles` table. Only
//! `superadmin` carries extra privileges; every other value is treated as a
//! regular team member.

use crate::profile::Profile;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role stored on a profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Shop owner with team management rights.
    Superadmin,
    /// Invited partner or admin.
    Partner,
    /// Any other value found in the table.
    Other(String),
}

impl Role {
    /// Returns the stored string form of the role.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Superadmin => "superadmin",
            Self::Partner => "partner",
            Self::Other(value) => value,
        }
    }

    /// Returns true for the superadmin role.
    #[must_use]
    pub fn is_superadmin(&self) -> bool {
        matches!(self, Self::Superadmin)
    }

    /// Badge label shown in the team listing.
    #[must_use]
    pub fn label(&self) -> &'static str {
        if self.is_superadmin() {
            "Super Admin"
        } else {
            "Partner / Admin"
        }
    }

    /// Returns true if this role grants what `required` asks for.
    ///
    /// Superadmin satisfies every requirement; other roles only satisfy
    /// themselves.
    #[must_use]
    pub fn satisfies(&self, required: &Role) -> bool {
        self.is_superadmin() || self == required
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Partner
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.trim() {
            "superadmin" => Self::Superadmin,
            "partner" => Self::Partner,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a role check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// The profile may see the page.
    Allow,
    /// The profile may not see the page.
    Deny(DenyReason),
}

impl Access {
    /// Returns true if access is granted.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Why a role check failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// The user has no profile row.
    MissingProfile,
    /// The profile's role does not satisfy the requirement.
    InsufficientRole { actual: Role, required: Role },
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingProfile => write!(f, "no profile found"),
            Self::InsufficientRole { actual, required } => {
                write!(f, "role '{actual}' does not satisfy '{required}'")
            }
        }
    }
}

/// Checks a profile against the role a page requires.
#[must_use]
pub fn authorize(profile: Option<&Profile>, required: &Role) -> Access {
    match profile {
        None => Access::Deny(DenyReason::MissingProfile),
        Some(profile) if profile.role().satisfies(required) => Access::Allow,
        Some(profile) => Access::Deny(DenyReason::InsufficientRole {
            actual: profile.role().clone(),
            required: required.clone(),
        }),
    }
}
