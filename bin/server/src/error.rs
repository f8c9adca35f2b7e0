//! Domain error types for server operations.
//!
//! Each error converts into a user-safe `ServerFnError` for server
//! functions, and HTTP-facing ones into a JSON response. Internal details
//! are logged where the error is raised, never shown.

use ataraxia_platform_access::{AuthenticationError, DenyReason};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use leptos::server_fn::error::ServerFnError;
use std::fmt;

use crate::messages::{ACCESS_DENIED_MESSAGE, SESSION_REQUIRED_MESSAGE, TEAM_LOAD_FAILED_MESSAGE};

/// Converts an auth service error into a user-safe `ServerFnError`.
pub fn auth_server_error(error: &AuthenticationError) -> ServerFnError {
    ServerFnError::new(error.user_message())
}

/// Session-related errors.
#[derive(Debug)]
pub enum SessionError {
    /// The session cookie could not be persisted.
    CookieWrite { details: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CookieWrite { details } => write!(f, "failed to write session cookie: {details}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl SessionError {
    /// Convert to a user-safe ServerFnError.
    pub fn into_server_error(self) -> ServerFnError {
        match &self {
            SessionError::CookieWrite { .. } => ServerFnError::new("Gagal menyimpan sesi"),
        }
    }
}

/// Team page errors.
#[derive(Debug)]
pub enum TeamError {
    /// The profile or team listing could not be read.
    LoadFailed { details: String },
}

impl fmt::Display for TeamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadFailed { details } => write!(f, "failed to load team: {details}"),
        }
    }
}

impl std::error::Error for TeamError {}

impl TeamError {
    /// Convert to a user-safe ServerFnError.
    pub fn into_server_error(self) -> ServerFnError {
        match &self {
            TeamError::LoadFailed { .. } => ServerFnError::new(TEAM_LOAD_FAILED_MESSAGE),
        }
    }
}

/// Invitation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteError {
    /// The request carried no email address.
    EmailRequired,
    /// No session is attached to the request.
    NotAuthenticated,
    /// The caller is not a superadmin.
    Forbidden { reason: DenyReason },
    /// The caller's profile could not be read.
    ProfileLookup { details: String },
    /// The callback URL could not be built from the public URL.
    InvalidCallbackUrl { details: String },
    /// The auth service refused or failed the invitation.
    Backend(AuthenticationError),
}

impl fmt::Display for InviteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmailRequired => write!(f, "email is required"),
            Self::NotAuthenticated => write!(f, "not authenticated"),
            Self::Forbidden { reason } => write!(f, "invitation denied: {reason}"),
            Self::ProfileLookup { details } => {
                write!(f, "failed to read caller profile: {details}")
            }
            Self::InvalidCallbackUrl { details } => {
                write!(f, "invalid invitation callback url: {details}")
            }
            Self::Backend(e) => write!(f, "invitation failed: {e}"),
        }
    }
}

impl std::error::Error for InviteError {}

impl InviteError {
    /// HTTP status for the invite endpoint.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::EmailRequired => StatusCode::BAD_REQUEST,
            Self::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::ProfileLookup { .. } | Self::InvalidCallbackUrl { .. } | Self::Backend(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to the caller.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::EmailRequired => AuthenticationError::EmailRequired.user_message(),
            Self::NotAuthenticated => SESSION_REQUIRED_MESSAGE.to_string(),
            Self::Forbidden { .. } => ACCESS_DENIED_MESSAGE.to_string(),
            Self::ProfileLookup { .. } => "Gagal memuat profil".to_string(),
            Self::InvalidCallbackUrl { .. } => "Terjadi kesalahan pada server.".to_string(),
            Self::Backend(e) => e.user_message(),
        }
    }

    /// Convert to a user-safe ServerFnError.
    pub fn into_server_error(self) -> ServerFnError {
        ServerFnError::new(self.user_message())
    }
}

impl IntoResponse for InviteError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.user_message() });
        (self.status(), Json(body)).into_response()
    }
}
