//! User-related server functions for identity and session management.

use crate::types::UserInfo;
use leptos::prelude::*;

/// Server function to get the current user info.
#[server]
pub async fn get_current_user() -> Result<Option<UserInfo>, ServerFnError> {
    use crate::auth::role_gate::current_profile;
    use crate::server_helpers::{app_state, current_session};

    let Some(session) = current_session().await? else {
        return Ok(None);
    };
    let state = app_state().await?;

    let profile = current_profile(&state, &session)
        .await
        .unwrap_or_else(|report| {
            tracing::warn!(
                user_id = %session.user_id(),
                error = %report.current_context(),
                "Failed to load profile, showing restricted view"
            );
            None
        });

    Ok(Some(UserInfo::new(session.user(), profile.as_ref())))
}
