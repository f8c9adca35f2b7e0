//! Invitation issuance.
//!
//! `POST /api/invite` sends an invitation email whose link lands on the
//! session exchange handler with `next=/update-password`. The email is
//! validated first, then the caller must be a signed-in superadmin.

use ataraxia_platform_access::{
    Access, Invitation, Role, Session, authorize, validate_invite_email,
};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use url::Url;

use super::AppState;
use super::middleware::OptionalSession;
use crate::error::InviteError;

/// Message returned when the invitation was sent.
pub const INVITE_SENT_MESSAGE: &str = "Undangan berhasil dikirim";

#[derive(Debug, Default, Deserialize)]
struct InviteRequest {
    email: Option<String>,
}

/// Builds the absolute callback URL embedded in invitation emails.
pub fn invite_redirect_url(state: &AppState) -> Result<Url, InviteError> {
    let mut url = Url::parse(&state.public_url).map_err(|e| InviteError::InvalidCallbackUrl {
        details: e.to_string(),
    })?;
    url.set_path(state.flow.callback_variant.path());
    url.set_query(Some(&state.flow.invite_query()));
    Ok(url)
}

/// Sends an invitation on behalf of `session`.
///
/// # Errors
///
/// Fails with `EmailRequired` before anything else is checked, then with
/// `NotAuthenticated` or `Forbidden` unless the caller is a superadmin.
#[instrument(skip(state, session), fields(caller = ?session.map(Session::user_id)))]
pub async fn invite(
    state: &AppState,
    session: Option<&Session>,
    email: Option<&str>,
) -> Result<Invitation, InviteError> {
    let email = validate_invite_email(email).map_err(|_| InviteError::EmailRequired)?;
    let session = session.ok_or(InviteError::NotAuthenticated)?;

    let profile = state
        .profiles
        .find_profile(session, session.user_id())
        .await
        .map_err(|report| {
            error!(error = %report.current_context(), "failed to read caller profile");
            InviteError::ProfileLookup {
                details: report.current_context().to_string(),
            }
        })?;
    if let Access::Deny(reason) = authorize(profile.as_ref(), &Role::Superadmin) {
        warn!(user_id = %session.user_id(), reason = %reason, "invitation denied");
        return Err(InviteError::Forbidden { reason });
    }

    let redirect_to = invite_redirect_url(state)?;
    let invitation = state
        .gateway
        .invite_user(&email, redirect_to.as_str())
        .await
        .map_err(|report| {
            error!(email = %email, error = %report.current_context(), "invitation failed");
            InviteError::Backend(report.current_context().clone())
        })?;

    info!(email = %email, invited_by = %session.user_id(), "invitation sent");
    Ok(invitation)
}

/// Handles `POST /api/invite` with body `{ "email": "..." }`.
///
/// | Status | Body | When |
/// |---|---|---|
/// | 200 | `{ "message", "data" }` | invitation sent |
/// | 400 | `{ "error": "Email wajib diisi" }` | email missing or blank |
/// | 401 | `{ "error": .. }` | no session |
/// | 403 | `{ "error": .. }` | caller is not a superadmin |
/// | 500 | `{ "error": .. }` | profile lookup or auth service failure |
///
/// The 401 and 403 rows are a hardening on top of the public
/// 200/400/500 contract: sending invitations uses the service-role key, so
/// the endpoint does not accept anonymous or partner callers.
pub async fn issue_invite(
    State(state): State<Arc<AppState>>,
    OptionalSession(session): OptionalSession,
    body: Bytes,
) -> Response {
    let request: InviteRequest = serde_json::from_slice(&body).unwrap_or_default();
    match invite(&state, session.as_ref(), request.email.as_deref()).await {
        Ok(invitation) => Json(serde_json::json!({
            "message": INVITE_SENT_MESSAGE,
            "data": invitation.raw,
        }))
        .into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_support::state_with;
    use crate::config::CallbackVariant;
    use ataraxia_platform_access::{AuthenticationError, DenyReason, StoreError};
    use ataraxia_testing::FakeBackend;

    #[tokio::test]
    async fn missing_email_is_rejected_before_anything_else() {
        let backend = FakeBackend::new();
        let state = state_with(&backend);
        for email in [None, Some(""), Some("   ")] {
            let result = invite(&state, None, email).await;
            assert_eq!(result.unwrap_err(), InviteError::EmailRequired);
        }
        assert_eq!(backend.find_profile_calls(), 0);
        assert_eq!(backend.invite_calls(), 0);
    }

    #[tokio::test]
    async fn requires_session() {
        let backend = FakeBackend::new();
        let state = state_with(&backend);
        let result = invite(&state, None, Some("a@b.com")).await;
        assert_eq!(result.unwrap_err(), InviteError::NotAuthenticated);
        assert_eq!(backend.invite_calls(), 0);
    }

    #[tokio::test]
    async fn partner_is_forbidden() {
        let backend = FakeBackend::new();
        let partner = backend.add_user("partner@ataraxia.id", "pw", Role::Partner);
        let session = backend.issue_session(&partner);
        let state = state_with(&backend);

        let result = invite(&state, Some(&session), Some("a@b.com")).await;
        assert!(matches!(
            result.unwrap_err(),
            InviteError::Forbidden {
                reason: DenyReason::InsufficientRole { .. }
            }
        ));
        assert_eq!(backend.invite_calls(), 0);
    }

    #[tokio::test]
    async fn profile_read_failure_is_internal() {
        let backend = FakeBackend::new();
        let owner = backend.add_user("owner@ataraxia.id", "pw", Role::Superadmin);
        let session = backend.issue_session(&owner);
        backend.fail_profile_reads_with(StoreError::Transport {
            details: "connection reset".to_string(),
        });
        let state = state_with(&backend);

        let result = invite(&state, Some(&session), Some("a@b.com")).await;
        assert!(matches!(result.unwrap_err(), InviteError::ProfileLookup { .. }));
        assert_eq!(backend.invite_calls(), 0);
    }

    #[tokio::test]
    async fn superadmin_invites_with_update_password_redirect() {
        let backend = FakeBackend::new();
        let owner = backend.add_user("owner@ataraxia.id", "pw", Role::Superadmin);
        let session = backend.issue_session(&owner);
        let state = state_with(&backend);

        let invitation = invite(&state, Some(&session), Some(" a@b.com "))
            .await
            .expect("invite");
        assert_eq!(invitation.user.email(), Some("a@b.com"));

        let sent = backend.invitations();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "a@b.com");
        assert_eq!(
            sent[0].1,
            "https://app.ataraxia.id/auth/confirm?next=/update-password"
        );
    }

    #[tokio::test]
    async fn backend_failure_is_surfaced() {
        let backend = FakeBackend::new();
        let owner = backend.add_user("owner@ataraxia.id", "pw", Role::Superadmin);
        let session = backend.issue_session(&owner);
        backend.fail_invites_with(AuthenticationError::DuplicateUser {
            email: "a@b.com".to_string(),
        });
        let state = state_with(&backend);

        let error = invite(&state, Some(&session), Some("a@b.com"))
            .await
            .unwrap_err();
        assert_eq!(error.user_message(), "Email a@b.com sudah terdaftar");
    }

    #[test]
    fn server_variant_targets_callback_route() {
        let backend = FakeBackend::new();
        let state = state_with(&backend);
        let mut flow = state.flow.clone();
        flow.callback_variant = CallbackVariant::Server;
        let state = AppState::new(
            state.gateway.clone(),
            state.profiles.clone(),
            "https://app.ataraxia.id/",
            state.session_config.clone(),
            flow,
        );
        assert_eq!(
            invite_redirect_url(&state).expect("url").as_str(),
            "https://app.ataraxia.id/auth/callback?next=/update-password"
        );
    }
}
