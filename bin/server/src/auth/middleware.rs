//! The Route Guard middleware and session extractors for Axum.

use ataraxia_platform_access::{GuardDecision, Session, is_guarded_path};
use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, warn};

use super::AppState;
use super::cookies::SessionCookies;
use super::resolver::CookieSessionProvider;

/// The session the Route Guard resolved, stored as a request extension.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Option<Session>);

/// Runs the Route Guard decision table in front of every navigable path.
///
/// Redirects use `307 Temporary Redirect`. Cookie changes from resolving
/// the session (refresh, clearing a dead session) are written on whichever
/// response goes out, unless the handler already set the session cookie.
pub async fn route_guard(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if !is_guarded_path(&path) {
        return next.run(request).await;
    }

    let provider = CookieSessionProvider::new(state.clone(), jar);
    let resolution = provider.resolution().await.clone();
    let cookies = resolution
        .update
        .cookies(&state.session_config, provider.jar());

    match state
        .flow
        .guard_rules()
        .decide(resolution.session.is_some(), &path)
    {
        GuardDecision::Redirect { location, reason } => {
            debug!(path = %path, location = %location, ?reason, "route guard redirect");
            let mut response = Redirect::temporary(&location).into_response();
            append_cookies(response.headers_mut(), &cookies);
            response
        }
        GuardDecision::PassThrough => {
            debug!(path = %path, signed_in = resolution.session.is_some(), "route guard pass");
            request
                .extensions_mut()
                .insert(CurrentSession(resolution.session));
            let mut response = next.run(request).await;
            let codec = SessionCookies::new(&state.session_config);
            if !sets_session_cookie(response.headers(), &codec) {
                append_cookies(response.headers_mut(), &cookies);
            }
            response
        }
    }
}

/// Appends `Set-Cookie` headers.
pub fn append_cookies(headers: &mut HeaderMap, cookies: &[Cookie<'static>]) {
    for cookie in cookies {
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => warn!(cookie = %cookie.name(), error = %e, "skipping unrepresentable cookie"),
        }
    }
}

fn sets_session_cookie(headers: &HeaderMap, codec: &SessionCookies<'_>) -> bool {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split_once('=').map(|(name, _)| name.trim()))
        .any(|name| codec.is_session_cookie(name))
}

/// Extractor for the current session, if any.
///
/// Uses the session the Route Guard resolved; outside the guard the
/// cookies are resolved directly and cookie changes are dropped.
pub struct OptionalSession(pub Option<Session>);

impl<S> FromRequestParts<S> for OptionalSession
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(CurrentSession(session)) = parts.extensions.get::<CurrentSession>() {
            return Ok(OptionalSession(session.clone()));
        }
        let app_state = Arc::<AppState>::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let provider = CookieSessionProvider::new(app_state, jar);
        Ok(OptionalSession(provider.resolution().await.session.clone()))
    }
}
