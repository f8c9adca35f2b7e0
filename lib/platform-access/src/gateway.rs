//! The contract for talking to the hosted auth service.
//!
//! `AuthGateway` covers the handful of account operations the back office
//! needs. Persisting the returned session is the caller's job; the server
//! writes it into cookies.

use async_trait::async_trait;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};

use crate::error::AuthenticationError;
use crate::session::Session;
use crate::user::User;

/// Shortest password accepted when setting a password.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Result of issuing an invitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    /// The invited user as created by the auth service.
    pub user: User,
    /// The provider's response body, passed through to the caller.
    pub raw: serde_json::Value,
}

/// Account operations against the hosted auth service.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Signs in with email and password.
    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, Report<AuthenticationError>>;

    /// Revokes the session at the provider.
    async fn sign_out(&self, session: &Session) -> Result<(), Report<AuthenticationError>>;

    /// Sends an invitation email whose link points at `redirect_to`.
    async fn invite_user(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<Invitation, Report<AuthenticationError>>;

    /// Sets a new password for the session's user.
    async fn update_password(
        &self,
        session: &Session,
        new_password: &str,
    ) -> Result<User, Report<AuthenticationError>>;

    /// Exchanges a one-time code for a session.
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<Session, Report<AuthenticationError>>;

    /// Obtains a fresh session from a refresh token.
    async fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> Result<Session, Report<AuthenticationError>>;

    /// Fetches the user an access token belongs to.
    async fn get_user(&self, access_token: &str) -> Result<User, Report<AuthenticationError>>;
}

/// Checks the email of an invitation request.
///
/// Returns the trimmed address.
pub fn validate_invite_email(email: Option<&str>) -> Result<String, AuthenticationError> {
    match email.map(str::trim) {
        Some(email) if !email.is_empty() => Ok(email.to_string()),
        _ => Err(AuthenticationError::EmailRequired),
    }
}

/// Checks a new password before it is sent to the auth service.
pub fn validate_new_password(password: &str) -> Result<(), AuthenticationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthenticationError::PasswordTooShort {
            min_length: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}
