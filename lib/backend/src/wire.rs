//! Request and response bodies of the hosted backend, and the mapping from
//! its error responses onto our error types.

use ataraxia_platform_access::{AuthenticationError, Session, StoreError, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of a successful `/auth/v1/token` call.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

/// Lifetime assumed when the service omits both expiry fields.
const DEFAULT_EXPIRES_IN: i64 = 3600;

impl TokenResponse {
    /// Converts the response into a session, preferring the absolute expiry.
    pub(crate) fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|at| DateTime::<Utc>::from_timestamp(at, 0));
        match expires_at {
            Some(at) => Session::new(self.access_token, self.refresh_token, at, self.user),
            None => Session::from_expires_in(
                self.access_token,
                self.refresh_token,
                self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
                self.user,
            ),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PasswordGrant<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshGrant<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct PkceGrant<'a> {
    pub auth_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_verifier: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct InviteBody<'a> {
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct PasswordUpdate<'a> {
    pub password: &'a str,
}

/// Error body. The auth service and the data service use different field
/// names, so every known one is optional.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    fn code(&self) -> Option<&str> {
        self.error_code.as_deref().or(self.error.as_deref())
    }

    fn message(&self, status: u16) -> String {
        self.msg
            .as_deref()
            .or(self.error_description.as_deref())
            .or(self.message.as_deref())
            .or(self.error.as_deref())
            .map_or_else(|| format!("HTTP {status}"), str::to_string)
    }
}

/// Maps an auth service error response onto an [`AuthenticationError`].
///
/// `email` is the address the request was about, if any.
pub(crate) fn classify_auth_error(
    status: u16,
    body: &str,
    email: Option<&str>,
) -> AuthenticationError {
    let parsed = ErrorBody::parse(body);
    let message = parsed.message(status);
    match parsed.code() {
        Some("email_exists" | "user_already_exists") => AuthenticationError::DuplicateUser {
            email: email.unwrap_or_default().to_string(),
        },
        _ if status == 422 && message.contains("already been registered") => {
            AuthenticationError::DuplicateUser {
                email: email.unwrap_or_default().to_string(),
            }
        }
        Some("invalid_credentials" | "invalid_grant") => AuthenticationError::InvalidCredentials,
        _ if status == 401 || status == 403 => AuthenticationError::NotAuthenticated,
        _ => AuthenticationError::Provider { status, message },
    }
}

/// Maps a data service error response onto a [`StoreError`].
pub(crate) fn classify_store_error(status: u16, body: &str) -> StoreError {
    if status == 401 || status == 403 {
        return StoreError::Unauthorized;
    }
    StoreError::Request {
        status,
        message: ErrorBody::parse(body).message(status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_user_by_code() {
        let body = r#"{"code":422,"error_code":"email_exists","msg":"A user with this email address has already been registered"}"#;
        assert_eq!(
            classify_auth_error(422, body, Some("a@b.com")),
            AuthenticationError::DuplicateUser {
                email: "a@b.com".to_string()
            }
        );
    }

    #[test]
    fn duplicate_user_by_message() {
        let body = r#"{"msg":"A user with this email address has already been registered"}"#;
        assert!(matches!(
            classify_auth_error(422, body, Some("a@b.com")),
            AuthenticationError::DuplicateUser { .. }
        ));
    }

    #[test]
    fn invalid_credentials_old_and_new_format() {
        let new = r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#;
        let old = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(
            classify_auth_error(400, new, None),
            AuthenticationError::InvalidCredentials
        );
        assert_eq!(
            classify_auth_error(400, old, None),
            AuthenticationError::InvalidCredentials
        );
    }

    #[test]
    fn unauthorized_status() {
        assert_eq!(
            classify_auth_error(401, "{}", None),
            AuthenticationError::NotAuthenticated
        );
    }

    #[test]
    fn other_errors_keep_provider_message() {
        assert_eq!(
            classify_auth_error(429, r#"{"msg":"Email rate limit exceeded"}"#, None),
            AuthenticationError::Provider {
                status: 429,
                message: "Email rate limit exceeded".to_string()
            }
        );
        assert_eq!(
            classify_auth_error(502, "<html>bad gateway</html>", None),
            AuthenticationError::Provider {
                status: 502,
                message: "HTTP 502".to_string()
            }
        );
    }

    #[test]
    fn store_errors() {
        assert_eq!(classify_store_error(401, ""), StoreError::Unauthorized);
        assert_eq!(
            classify_store_error(
                400,
                r#"{"code":"42703","message":"column profiles.rol does not exist"}"#
            ),
            StoreError::Request {
                status: 400,
                message: "column profiles.rol does not exist".to_string()
            }
        );
    }

    #[test]
    fn token_response_prefers_absolute_expiry() {
        let json = r#"{
            "access_token": "at",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1750000000,
            "refresh_token": "rt",
            "user": {"id": "00000000-0000-0000-0000-000000000003", "email": "a@b.com"}
        }"#;
        let response: TokenResponse = serde_json::from_str(json).expect("deserialize");
        let session = response.into_session();
        assert_eq!(session.expires_at().timestamp(), 1_750_000_000);
        assert_eq!(session.user().email(), Some("a@b.com"));
    }

    #[test]
    fn token_response_falls_back_to_relative_expiry() {
        let json = r#"{
            "access_token": "at",
            "expires_in": 60,
            "refresh_token": "rt",
            "user": {"id": "00000000-0000-0000-0000-000000000003"}
        }"#;
        let response: TokenResponse = serde_json::from_str(json).expect("deserialize");
        let session = response.into_session();
        assert!(!session.is_expired());
        assert!(session.expires_within(chrono::Duration::seconds(120)));
    }
}
