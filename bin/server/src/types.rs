//! Shared types for server functions and components.

use ataraxia_platform_access::{Profile, User};
use leptos::server_fn::error::ServerFnError;
use serde::{Deserialize, Serialize};

/// The signed-in user, as shown in the dashboard shell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub email: Option<String>,
    pub display_name: String,
    pub role_label: String,
    pub is_superadmin: bool,
}

impl UserInfo {
    /// Combines the auth user with their profile, if one could be read.
    pub fn new(user: &User, profile: Option<&Profile>) -> Self {
        let display_name = match profile.and_then(Profile::full_name).map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => user.email().unwrap_or("Partner").to_string(),
        };
        Self {
            email: user.email().map(str::to_string),
            display_name,
            role_label: profile
                .map(|p| p.role().label())
                .unwrap_or_default()
                .to_string(),
            is_superadmin: profile.is_some_and(|p| p.role().is_superadmin()),
        }
    }
}

/// One row of the team listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role_label: String,
    pub is_superadmin: bool,
}

impl From<&Profile> for TeamMember {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id().to_string(),
            name: profile.display_name().to_string(),
            email: profile.email().unwrap_or("-").to_string(),
            role_label: profile.role().label().to_string(),
            is_superadmin: profile.role().is_superadmin(),
        }
    }
}

/// What the team page may show.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamView {
    /// No session.
    Anonymous,
    /// The caller is not a superadmin.
    Denied,
    /// The team, newest first.
    Members(Vec<TeamMember>),
}

/// Returns the user-safe message carried by a server function error.
pub fn error_message(error: &ServerFnError) -> String {
    match error {
        ServerFnError::ServerError(message) => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ataraxia_core::UserId;
    use ataraxia_platform_access::Role;

    fn user_id(n: u8) -> UserId {
        format!("00000000-0000-0000-0000-0000000000{n:02}")
            .parse()
            .expect("valid id")
    }

    #[test]
    fn user_info_prefers_profile_name() {
        let id = user_id(1);
        let user = User::new(id, Some("owner@ataraxia.id".to_string()));
        let profile = Profile::new(
            id,
            Some("owner@ataraxia.id".to_string()),
            Some("Rina".to_string()),
            Role::Superadmin,
        );

        let info = UserInfo::new(&user, Some(&profile));
        assert_eq!(info.display_name, "Rina");
        assert_eq!(info.role_label, "Super Admin");
        assert!(info.is_superadmin);

        let info = UserInfo::new(&user, None);
        assert_eq!(info.display_name, "owner@ataraxia.id");
        assert!(!info.is_superadmin);
    }

    #[test]
    fn team_member_from_unnamed_profile() {
        let profile = Profile::new(user_id(2), None, Some("  ".to_string()), Role::Partner);
        let member = TeamMember::from(&profile);
        assert_eq!(member.name, "Tanpa Nama");
        assert_eq!(member.email, "-");
        assert_eq!(member.role_label, "Partner / Admin");
        assert!(!member.is_superadmin);
    }

    #[test]
    fn server_error_message_is_unwrapped() {
        let error = ServerFnError::new("Email wajib diisi");
        assert_eq!(error_message(&error), "Email wajib diisi");
    }
}
