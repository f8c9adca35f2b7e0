//! Helper functions for server functions with proper error handling and logging.
//!
//! Server functions reach the application state through a request
//! extension and the session through the Route Guard's resolution, falling
//! back to the request cookies when the guard did not run.

use crate::auth::cookies::SessionCookies;
use crate::auth::{AppState, CookieSessionProvider, CurrentSession};
use crate::error::SessionError;
use ataraxia_platform_access::Session;
use axum::Extension;
use axum::http::{HeaderValue, header::SET_COOKIE, request::Parts};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use leptos::prelude::*;
use leptos_axum::ResponseOptions;
use std::sync::Arc;

/// Gets the application state from the request extensions.
pub async fn app_state() -> Result<Arc<AppState>, ServerFnError> {
    let Extension(state): Extension<Arc<AppState>> = leptos_axum::extract().await?;
    Ok(state)
}

/// Returns the session attached to the current request, if any.
pub async fn current_session() -> Result<Option<Session>, ServerFnError> {
    if let Some(CurrentSession(session)) = use_context::<Parts>()
        .as_ref()
        .and_then(|parts| parts.extensions.get::<CurrentSession>())
    {
        return Ok(session.clone());
    }
    let state = app_state().await?;
    let jar: CookieJar = leptos_axum::extract().await?;
    let provider = CookieSessionProvider::new(state, jar);
    Ok(provider.resolution().await.session.clone())
}

/// Writes `session` into the response cookies and clears the code verifier.
pub async fn persist_session(state: &AppState, session: &Session) -> Result<(), SessionError> {
    let jar: CookieJar = leptos_axum::extract().await.map_err(|e| SessionError::CookieWrite {
        details: e.to_string(),
    })?;
    let codec = SessionCookies::new(&state.session_config);
    let mut cookies = codec
        .write(&jar, session)
        .map_err(|e| {
            tracing::error!(user_id = %session.user_id(), error = %e, "Failed to encode session cookie");
            SessionError::CookieWrite {
                details: e.to_string(),
            }
        })?;
    if jar.get(&state.session_config.code_verifier_cookie()).is_some() {
        cookies.push(codec.clear_code_verifier());
    }
    append_cookies(&cookies)
}

/// Returns the PKCE code verifier sent with the current request.
pub async fn code_verifier(state: &AppState) -> Option<String> {
    let jar: CookieJar = leptos_axum::extract().await.ok()?;
    SessionCookies::new(&state.session_config).code_verifier(&jar)
}

fn append_cookies(cookies: &[Cookie<'static>]) -> Result<(), SessionError> {
    let response = use_context::<ResponseOptions>().ok_or_else(|| SessionError::CookieWrite {
        details: "no response options in context".to_string(),
    })?;
    for cookie in cookies {
        let value = HeaderValue::from_str(&cookie.to_string()).map_err(|e| {
            SessionError::CookieWrite {
                details: e.to_string(),
            }
        })?;
        response.append_header(SET_COOKIE, value);
    }
    Ok(())
}
