//! Session exchange callback and sign-out routes.

use ataraxia_platform_access::{
    ExchangeBackend, ExchangeOutcome, ExchangeParams, ExchangeVariant, FAILURE_NOTICE, Session,
    SessionExchangeHandler,
};
use axum::{
    extract::{Query, State},
    http::{
        StatusCode,
        header::{CACHE_CONTROL, LOCATION},
    },
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

use super::AppState;
use super::cookies::SessionCookies;
use super::middleware::{OptionalSession, append_cookies};

/// Query parameters of an invitation or magic link.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    next: Option<String>,
}

/// Exchange backend for a single callback request.
struct ServerExchange<'a> {
    state: &'a AppState,
    code_verifier: Option<String>,
    existing: Option<Session>,
    established: Mutex<Option<Session>>,
}

impl ServerExchange<'_> {
    fn take_established(&self) -> Option<Session> {
        self.established
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl ExchangeBackend for ServerExchange<'_> {
    async fn exchange_code(&self, code: &str) -> bool {
        match self
            .state
            .gateway
            .exchange_code(code, self.code_verifier.as_deref())
            .await
        {
            Ok(session) => {
                info!(user_id = %session.user_id(), "exchanged one-time code for a session");
                *self
                    .established
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(session);
                true
            }
            Err(report) => {
                warn!(error = %report.current_context(), "one-time code exchange failed");
                false
            }
        }
    }

    async fn has_session(&self) -> bool {
        self.existing.is_some()
    }
}

/// Handles `GET /auth/callback?code=..&next=..`.
///
/// Exchanges the one-time code, stores the session cookie and answers with
/// `302 Found` to `{public_url}{next}`. Without a usable code or session the
/// redirect goes to `/login?error=auth-code-error`.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    OptionalSession(existing): OptionalSession,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let params = ExchangeParams::new(query.code.as_deref(), query.next.as_deref());
    let codec = SessionCookies::new(&state.session_config);
    let backend = ServerExchange {
        state: &state,
        code_verifier: codec.code_verifier(&jar),
        existing,
        established: Mutex::new(None),
    };

    let handler = SessionExchangeHandler::new(ExchangeVariant::Server);
    let outcome = handler
        .handle(&params, &backend)
        .await
        .unwrap_or_else(failure);

    let mut cookies = Vec::new();
    let outcome = match backend.take_established() {
        Some(session) => match codec.write(&jar, &session) {
            Ok(written) => {
                cookies = written;
                outcome
            }
            Err(e) => {
                error!(user_id = %session.user_id(), error = %e, "failed to encode session cookie");
                failure()
            }
        },
        None => outcome,
    };
    if jar.get(&state.session_config.code_verifier_cookie()).is_some() {
        cookies.push(codec.clear_code_verifier());
    }

    let location = format!("{}{}", state.public_url, outcome.location());
    debug!(location = %location, success = outcome.is_success(), "callback redirect");
    let mut response = (
        StatusCode::FOUND,
        [(LOCATION, location), (CACHE_CONTROL, "no-store".to_string())],
    )
        .into_response();
    append_cookies(response.headers_mut(), &cookies);
    response
}

fn failure() -> ExchangeOutcome {
    ExchangeOutcome::Failure {
        redirect: ExchangeVariant::Server.failure_redirect(),
        notice: FAILURE_NOTICE,
    }
}

/// Handles `GET /auth/logout`.
///
/// Revokes the session at the provider when there is one, clears every
/// session cookie and redirects to the sign-in page. Safe to call without a
/// session.
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let codec = SessionCookies::new(&state.session_config);
    match codec.read(&jar) {
        Ok(Some(session)) => match state.gateway.sign_out(&session).await {
            Ok(()) => info!(user_id = %session.user_id(), "signed out"),
            Err(report) => warn!(
                user_id = %session.user_id(),
                error = %report.current_context(),
                "provider sign-out failed, clearing cookies anyway"
            ),
        },
        Ok(None) => debug!("sign-out without a session"),
        Err(e) => debug!(error = %e, "discarding unreadable session cookie on sign-out"),
    }

    let mut response = Redirect::to(&state.flow.login_path).into_response();
    append_cookies(response.headers_mut(), &codec.clear(&jar));
    response
}
