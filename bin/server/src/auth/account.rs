//! Account operations behind the sign-in, set-password and confirm pages.

use ataraxia_platform_access::{
    AuthenticationError, Session, User, validate_invite_email, validate_new_password,
};
use tracing::{info, instrument, warn};

use super::AppState;

/// Signs in with email and password.
#[instrument(skip(state, password))]
pub async fn sign_in(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<Session, AuthenticationError> {
    let email = validate_invite_email(Some(email))?;
    if password.is_empty() {
        return Err(AuthenticationError::InvalidCredentials);
    }
    let session = state
        .gateway
        .sign_in(&email, password)
        .await
        .map_err(|report| {
            warn!(email = %email, error = %report.current_context(), "sign-in failed");
            report.current_context().clone()
        })?;
    info!(user_id = %session.user_id(), "signed in");
    Ok(session)
}

/// Sets a new password for the signed-in user.
#[instrument(skip(state, session, new_password))]
pub async fn update_password(
    state: &AppState,
    session: Option<&Session>,
    new_password: &str,
) -> Result<User, AuthenticationError> {
    validate_new_password(new_password)?;
    let session = session.ok_or(AuthenticationError::NotAuthenticated)?;
    let user = state
        .gateway
        .update_password(session, new_password)
        .await
        .map_err(|report| {
            warn!(user_id = %session.user_id(), error = %report.current_context(), "password update failed");
            report.current_context().clone()
        })?;
    info!(user_id = %user.id(), "password updated");
    Ok(user)
}

/// Exchanges a one-time code from the browser for a session.
#[instrument(skip_all)]
pub async fn exchange_code(
    state: &AppState,
    code: &str,
    code_verifier: Option<&str>,
) -> Result<Session, AuthenticationError> {
    let session = state
        .gateway
        .exchange_code(code, code_verifier)
        .await
        .map_err(|report| {
            warn!(error = %report.current_context(), "one-time code exchange failed");
            report.current_context().clone()
        })?;
    info!(user_id = %session.user_id(), "exchanged one-time code for a session");
    Ok(session)
}

/// Adopts a session the auth service attached to the URL fragment.
///
/// The access token is confirmed with the auth service before it is trusted.
#[instrument(skip_all)]
pub async fn adopt_session(
    state: &AppState,
    access_token: &str,
    refresh_token: &str,
    expires_in: Option<i64>,
) -> Result<Session, AuthenticationError> {
    if access_token.is_empty() || refresh_token.is_empty() {
        return Err(AuthenticationError::NotAuthenticated);
    }
    let user = state.gateway.get_user(access_token).await.map_err(|report| {
        warn!(error = %report.current_context(), "session from link rejected");
        report.current_context().clone()
    })?;
    info!(user_id = %user.id(), "adopted session from link");
    Ok(Session::from_expires_in(
        access_token.to_string(),
        refresh_token.to_string(),
        expires_in.unwrap_or(3600),
        user,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_support::state_with;
    use ataraxia_platform_access::Role;
    use ataraxia_testing::FakeBackend;

    #[tokio::test]
    async fn sign_in_validates_before_calling_out() {
        let backend = FakeBackend::new();
        let state = state_with(&backend);

        assert_eq!(
            sign_in(&state, " ", "secret").await.unwrap_err(),
            AuthenticationError::EmailRequired
        );
        assert_eq!(
            sign_in(&state, "owner@ataraxia.id", "").await.unwrap_err(),
            AuthenticationError::InvalidCredentials
        );
        assert_eq!(backend.sign_in_calls(), 0);
    }

    #[tokio::test]
    async fn sign_in_with_wrong_password_fails() {
        let backend = FakeBackend::new();
        backend.add_user("owner@ataraxia.id", "secret", Role::Superadmin);
        let state = state_with(&backend);

        assert_eq!(
            sign_in(&state, "owner@ataraxia.id", "wrong").await.unwrap_err(),
            AuthenticationError::InvalidCredentials
        );
        let session = sign_in(&state, "owner@ataraxia.id", "secret")
            .await
            .expect("sign in");
        assert_eq!(session.user().email(), Some("owner@ataraxia.id"));
    }

    #[tokio::test]
    async fn update_password_requires_session_and_length() {
        let backend = FakeBackend::new();
        let user = backend.add_user("partner@ataraxia.id", "old-secret", Role::Partner);
        let session = backend.issue_session(&user);
        let state = state_with(&backend);

        assert_eq!(
            update_password(&state, Some(&session), "12345").await.unwrap_err(),
            AuthenticationError::PasswordTooShort { min_length: 6 }
        );
        assert_eq!(
            update_password(&state, None, "123456").await.unwrap_err(),
            AuthenticationError::NotAuthenticated
        );
        assert_eq!(backend.update_password_calls(), 0);

        update_password(&state, Some(&session), "new-secret")
            .await
            .expect("update");
        assert_eq!(
            backend.password_of("partner@ataraxia.id").as_deref(),
            Some("new-secret")
        );
    }

    #[tokio::test]
    async fn codes_are_single_use() {
        let backend = FakeBackend::new();
        let user = backend.add_user("partner@ataraxia.id", "pw", Role::Partner);
        let code = backend.issue_code(&user);
        let state = state_with(&backend);

        assert!(exchange_code(&state, &code, None).await.is_ok());
        assert!(matches!(
            exchange_code(&state, &code, None).await.unwrap_err(),
            AuthenticationError::InvalidCode { .. }
        ));
    }

    #[tokio::test]
    async fn adopted_session_must_be_known() {
        let backend = FakeBackend::new();
        let user = backend.add_user("partner@ataraxia.id", "pw", Role::Partner);
        let issued = backend.issue_session(&user);
        let state = state_with(&backend);

        let adopted = adopt_session(&state, issued.access_token(), issued.refresh_token(), Some(600))
            .await
            .expect("adopt");
        assert_eq!(adopted.user_id(), user.id());

        assert!(adopt_session(&state, "forged", "forged", None).await.is_err());
    }

    #[tokio::test]
    async fn adopted_session_lifetime_is_bounded() {
        let backend = FakeBackend::new();
        let user = backend.add_user("partner@ataraxia.id", "pw", Role::Partner);
        let issued = backend.issue_session(&user);
        let state = state_with(&backend);

        let huge = adopt_session(
            &state,
            issued.access_token(),
            issued.refresh_token(),
            Some(9_000_000_000_000_000),
        )
        .await
        .expect("adopt");
        assert!(huge.expires_within(chrono::Duration::seconds(
            ataraxia_platform_access::MAX_EXPIRES_IN + 60
        )));

        let negative = adopt_session(
            &state,
            issued.access_token(),
            issued.refresh_token(),
            Some(-1),
        )
        .await
        .expect("adopt");
        assert!(negative.is_expired());
    }
}
