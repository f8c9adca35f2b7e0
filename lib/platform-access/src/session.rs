//! Sessions issued by the hosted auth service.
//!
//! A session is the pair of bearer and refresh tokens plus the user they
//! belong to. It is created by signing in or by exchanging a one-time code
//! and is persisted in cookies by the server.

use async_trait::async_trait;
use ataraxia_core::UserId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::user::User;

/// An authenticated session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for API calls.
    access_token: String,
    /// Token used to obtain a fresh session.
    refresh_token: String,
    /// Token type, normally `bearer`.
    #[serde(default = "default_token_type")]
    token_type: String,
    /// When the access token stops being valid.
    #[serde(with = "chrono::serde::ts_seconds")]
    expires_at: DateTime<Utc>,
    /// The signed-in user.
    user: User,
}

/// Longest lifetime accepted from an `expires_in` value.
pub const MAX_EXPIRES_IN: i64 = 86_400 * 365;

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// Creates a session with an absolute expiry.
    #[must_use]
    pub fn new(
        access_token: String,
        refresh_token: String,
        expires_at: DateTime<Utc>,
        user: User,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: default_token_type(),
            expires_at,
            user,
        }
    }

    /// Creates a session that expires `expires_in` seconds from now.
    ///
    /// `expires_in` may come from the browser, so it is clamped to
    /// `0..=MAX_EXPIRES_IN`.
    #[must_use]
    pub fn from_expires_in(
        access_token: String,
        refresh_token: String,
        expires_in: i64,
        user: User,
    ) -> Self {
        Self::new(
            access_token,
            refresh_token,
            Utc::now() + Duration::seconds(expires_in.clamp(0, MAX_EXPIRES_IN)),
            user,
        )
    }

    /// Returns the bearer token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the refresh token.
    #[must_use]
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// Returns the token type.
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Returns when the access token expires.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns the signed-in user.
    #[must_use]
    pub fn user(&self) -> &User {
        &self.user
    }

    /// Returns the signed-in user's id.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user.id()
    }

    /// Replaces the user with a freshly fetched record.
    #[must_use]
    pub fn with_user(mut self, user: User) -> Self {
        self.user = user;
        self
    }

    /// Returns true if the access token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Returns true if the access token expires within `margin`.
    #[must_use]
    pub fn expires_within(&self, margin: Duration) -> bool {
        Utc::now() + margin >= self.expires_at
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Anything that can answer "who is making this request".
///
/// The server implements this on top of the request cookies; tests use
/// canned sessions.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Returns the current session, or `None` for anonymous requests.
    async fn current_session(&self) -> Option<Session>;

    /// Returns the current user, or `None` for anonymous requests.
    async fn current_user(&self) -> Option<User> {
        self.current_session().await.map(|s| s.user().clone())
    }
}
