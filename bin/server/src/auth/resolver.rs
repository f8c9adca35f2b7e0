//! Per-request session resolution from cookies.
//!
//! The cookie jar is the source of truth for the session. Every request
//! re-derives its view of it: decode the cookies, refresh tokens that are
//! about to expire, and confirm the access token with the auth service.
//! Any failure resolves to "no session" (fail closed).

use async_trait::async_trait;
use ataraxia_platform_access::{AuthenticationError, Session, SessionProvider};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, warn};

use super::AppState;
use super::cookies::SessionCookies;
use crate::config::SessionConfig;

/// What to do with the session cookies on the way out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieUpdate {
    /// Leave the cookies alone.
    Keep,
    /// Store a new session.
    Replace(Session),
    /// Remove the session cookies.
    Clear,
}

impl CookieUpdate {
    /// Cookies to set on the response.
    #[must_use]
    pub fn cookies(&self, config: &SessionConfig, jar: &CookieJar) -> Vec<Cookie<'static>> {
        let codec = SessionCookies::new(config);
        match self {
            Self::Keep => Vec::new(),
            Self::Clear => codec.clear(jar),
            Self::Replace(session) => codec.write(jar, session).unwrap_or_else(|e| {
                error!(error = %e, "failed to encode session cookie");
                codec.clear(jar)
            }),
        }
    }
}

/// The session a request carries, and the cookie change it implies.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub session: Option<Session>,
    pub update: CookieUpdate,
}

impl Resolution {
    fn anonymous() -> Self {
        Self {
            session: None,
            update: CookieUpdate::Keep,
        }
    }

    fn cleared() -> Self {
        Self {
            session: None,
            update: CookieUpdate::Clear,
        }
    }
}

/// Resolves the session carried by `jar`.
pub async fn resolve(state: &AppState, jar: &CookieJar) -> Resolution {
    let codec = SessionCookies::new(&state.session_config);
    let session = match codec.read(jar) {
        Ok(Some(session)) => session,
        Ok(None) => return Resolution::anonymous(),
        Err(e) => {
            debug!(error = %e, "discarding unreadable session cookie");
            return Resolution::cleared();
        }
    };

    let (session, update) = if session.expires_within(state.session_config.refresh_margin()) {
        match state.gateway.refresh_session(session.refresh_token()).await {
            Ok(fresh) => {
                debug!(user_id = %fresh.user_id(), "refreshed expiring session");
                (fresh.clone(), CookieUpdate::Replace(fresh))
            }
            Err(report) => {
                return match report.current_context() {
                    AuthenticationError::Transport { .. } => {
                        warn!(error = %report.current_context(), "session refresh unavailable");
                        Resolution::anonymous()
                    }
                    other => {
                        debug!(error = %other, "session refresh rejected");
                        Resolution::cleared()
                    }
                };
            }
        }
    } else {
        (session, CookieUpdate::Keep)
    };

    if !state.session_config.verify_with_provider {
        return Resolution {
            session: Some(session),
            update,
        };
    }

    match state.gateway.get_user(session.access_token()).await {
        Ok(user) => Resolution {
            session: Some(session.with_user(user)),
            update,
        },
        Err(report) => match report.current_context() {
            AuthenticationError::NotAuthenticated | AuthenticationError::InvalidCredentials => {
                debug!(user_id = %session.user_id(), "session rejected by auth service");
                Resolution::cleared()
            }
            other => {
                warn!(error = %other, "could not verify session, treating request as anonymous");
                Resolution::anonymous()
            }
        },
    }
}

/// [`SessionProvider`] backed by the request cookies.
///
/// Resolution happens at most once per provider.
pub struct CookieSessionProvider {
    state: Arc<AppState>,
    jar: CookieJar,
    resolution: OnceCell<Resolution>,
}

impl CookieSessionProvider {
    /// Creates a provider for one request.
    #[must_use]
    pub fn new(state: Arc<AppState>, jar: CookieJar) -> Self {
        Self {
            state,
            jar,
            resolution: OnceCell::new(),
        }
    }

    /// Resolves the session, reusing an earlier result.
    pub async fn resolution(&self) -> &Resolution {
        self.resolution
            .get_or_init(|| resolve(&self.state, &self.jar))
            .await
    }

    /// Returns the request cookies.
    #[must_use]
    pub fn jar(&self) -> &CookieJar {
        &self.jar
    }
}

#[async_trait]
impl SessionProvider for CookieSessionProvider {
    async fn current_session(&self) -> Option<Session> {
        self.resolution().await.session.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_support::{jar_for, state_with};
    use ataraxia_platform_access::Role;
    use ataraxia_testing::FakeBackend;
    use axum_extra::extract::cookie::Cookie;

    #[tokio::test]
    async fn no_cookie_is_anonymous() {
        let backend = FakeBackend::new();
        let state = state_with(&backend);
        let resolution = resolve(&state, &CookieJar::new()).await;
        assert!(resolution.session.is_none());
        assert_eq!(resolution.update, CookieUpdate::Keep);
        assert_eq!(backend.get_user_calls(), 0);
    }

    #[tokio::test]
    async fn valid_session_is_verified() {
        let backend = FakeBackend::new();
        let user = backend.add_user("owner@ataraxia.id", "pw", Role::Superadmin);
        let session = backend.issue_session(&user);
        let state = state_with(&backend);

        let resolution = resolve(&state, &jar_for(&state, &session)).await;
        assert_eq!(resolution.session.map(|s| s.user_id()), Some(user.id()));
        assert_eq!(resolution.update, CookieUpdate::Keep);
        assert_eq!(backend.get_user_calls(), 1);
        assert_eq!(backend.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn expiring_session_is_refreshed() {
        let backend = FakeBackend::new();
        let user = backend.add_user("owner@ataraxia.id", "pw", Role::Superadmin);
        let session = backend.issue_session_expiring_in(&user, 10);
        let state = state_with(&backend);

        let resolution = resolve(&state, &jar_for(&state, &session)).await;
        let current = resolution.session.expect("session");
        assert_ne!(current.access_token(), session.access_token());
        assert!(matches!(resolution.update, CookieUpdate::Replace(ref s) if s.access_token() == current.access_token()));
        assert_eq!(backend.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn revoked_session_clears_cookies() {
        let backend = FakeBackend::new();
        let user = backend.add_user("owner@ataraxia.id", "pw", Role::Superadmin);
        let session = backend.issue_session(&user);
        backend.revoke_user(&user);
        let state = state_with(&backend);

        let resolution = resolve(&state, &jar_for(&state, &session)).await;
        assert!(resolution.session.is_none());
        assert_eq!(resolution.update, CookieUpdate::Clear);
    }

    #[tokio::test]
    async fn failed_refresh_clears_cookies() {
        let backend = FakeBackend::new();
        let user = backend.add_user("owner@ataraxia.id", "pw", Role::Superadmin);
        let session = backend.issue_session_expiring_in(&user, -5);
        backend.revoke_user(&user);
        let state = state_with(&backend);

        let resolution = resolve(&state, &jar_for(&state, &session)).await;
        assert!(resolution.session.is_none());
        assert_eq!(resolution.update, CookieUpdate::Clear);
    }

    #[tokio::test]
    async fn unreadable_cookie_clears_cookies() {
        let backend = FakeBackend::new();
        let state = state_with(&backend);
        let jar = CookieJar::new().add(Cookie::new("sb-auth-token", "base64-%%%"));

        let resolution = resolve(&state, &jar).await;
        assert!(resolution.session.is_none());
        assert_eq!(resolution.update, CookieUpdate::Clear);
    }

    #[tokio::test]
    async fn provider_resolves_once() {
        let backend = FakeBackend::new();
        let user = backend.add_user("owner@ataraxia.id", "pw", Role::Superadmin);
        let session = backend.issue_session(&user);
        let state = state_with(&backend);
        let jar = jar_for(&state, &session);

        let provider = CookieSessionProvider::new(state, jar);
        assert!(provider.current_session().await.is_some());
        assert!(provider.current_user().await.is_some());
        assert_eq!(backend.get_user_calls(), 1);
    }
}
