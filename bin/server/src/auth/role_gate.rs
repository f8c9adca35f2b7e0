//! The Role Gate in front of superadmin pages.

use ataraxia_platform_access::{
    Access, DenyReason, Profile, Role, Session, StoreError, authorize,
};
use rootcause::prelude::Report;
use tracing::{debug, warn};

use super::AppState;

/// Result of gating the team page.
#[derive(Debug, Clone, PartialEq)]
pub enum TeamAccess {
    /// No session; the page renders nothing.
    Anonymous,
    /// The caller is not a superadmin.
    Denied(DenyReason),
    /// The caller may see the team, newest first.
    Granted(Vec<Profile>),
}

/// Fetches the profile of the session's user.
pub async fn current_profile(
    state: &AppState,
    session: &Session,
) -> Result<Option<Profile>, Report<StoreError>> {
    state.profiles.find_profile(session, session.user_id()).await
}

/// Gates the team listing on the superadmin role.
///
/// The listing is only fetched once access is granted. Fetch errors are
/// returned so the caller can fail closed.
pub async fn load_team(
    state: &AppState,
    session: Option<&Session>,
) -> Result<TeamAccess, Report<StoreError>> {
    let Some(session) = session else {
        debug!("team page requested without a session");
        return Ok(TeamAccess::Anonymous);
    };

    let profile = current_profile(state, session).await?;
    if let Access::Deny(reason) = authorize(profile.as_ref(), &Role::Superadmin) {
        warn!(user_id = %session.user_id(), reason = %reason, "team page denied");
        return Ok(TeamAccess::Denied(reason));
    }

    let profiles = state.profiles.list_profiles(session).await?;
    debug!(user_id = %session.user_id(), count = profiles.len(), "team loaded");
    Ok(TeamAccess::Granted(profiles))
}
