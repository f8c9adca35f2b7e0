//! Browser-side session exchange for invitation links (`/auth/confirm`).
//!
//! Runs the same state machine as `GET /auth/callback`, after the first
//! render. The auth service may hand over the session either as a one-time
//! `code` query parameter or as tokens in the URL fragment; both are tried
//! before giving up.

use crate::components::Toasts;
use ataraxia_platform_access::{
    ExchangeBackend, ExchangeOutcome, ExchangeParams, ExchangeVariant, SessionExchangeHandler,
};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::{use_navigate, use_query_map};
use std::sync::Arc;

/// Server function to exchange a one-time code and store the session.
///
/// Resolves to `false` when the code was rejected.
#[server]
pub async fn exchange_auth_code(code: String) -> Result<bool, ServerFnError> {
    use crate::auth::account;
    use crate::server_helpers::{app_state, code_verifier, persist_session};

    let state = app_state().await?;
    let verifier = code_verifier(&state).await;
    match account::exchange_code(&state, &code, verifier.as_deref()).await {
        Ok(session) => {
            persist_session(&state, &session)
                .await
                .map_err(|e| e.into_server_error())?;
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}

/// Server function to store a session handed over in the URL fragment.
///
/// Resolves to `false` when the auth service does not recognise the tokens.
#[server]
pub async fn confirm_session(
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
) -> Result<bool, ServerFnError> {
    use crate::auth::account;
    use crate::server_helpers::{app_state, persist_session};

    let state = app_state().await?;
    match account::adopt_session(&state, &access_token, &refresh_token, expires_in).await {
        Ok(session) => {
            persist_session(&state, &session)
                .await
                .map_err(|e| e.into_server_error())?;
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}

/// Server function reporting whether the request already carries a session.
#[server]
pub async fn has_session() -> Result<bool, ServerFnError> {
    use crate::server_helpers::current_session;

    Ok(current_session().await?.is_some())
}

/// Tokens the auth service appends to the URL fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: Option<i64>,
}

/// Parses `#access_token=..&refresh_token=..&expires_in=..`.
pub fn parse_fragment(fragment: &str) -> Option<FragmentTokens> {
    let mut access_token = None;
    let mut refresh_token = None;
    let mut expires_in = None;
    for pair in fragment.trim_start_matches('#').split('&') {
        match pair.split_once('=') {
            Some(("access_token", value)) if !value.is_empty() => {
                access_token = Some(value.to_string());
            }
            Some(("refresh_token", value)) if !value.is_empty() => {
                refresh_token = Some(value.to_string());
            }
            Some(("expires_in", value)) => expires_in = value.parse().ok(),
            _ => {}
        }
    }
    Some(FragmentTokens {
        access_token: access_token?,
        refresh_token: refresh_token?,
        expires_in,
    })
}

/// Exchange backend that calls back into the server.
struct BrowserExchange {
    fragment: Option<FragmentTokens>,
}

impl ExchangeBackend for BrowserExchange {
    async fn exchange_code(&self, code: &str) -> bool {
        matches!(exchange_auth_code(code.to_string()).await, Ok(true))
    }

    async fn has_session(&self) -> bool {
        if let Some(tokens) = self.fragment.clone() {
            let confirmed =
                confirm_session(tokens.access_token, tokens.refresh_token, tokens.expires_in).await;
            if matches!(confirmed, Ok(true)) {
                return true;
            }
        }
        matches!(has_session().await, Ok(true))
    }
}

/// Confirmation page shown while the exchange runs.
#[component]
pub fn ConfirmPage() -> impl IntoView {
    // One handler per page instance; re-running the effect cannot exchange twice.
    let handler = StoredValue::new(Arc::new(SessionExchangeHandler::new(
        ExchangeVariant::Client,
    )));
    let query = use_query_map();
    let toasts = Toasts::from_context();
    let navigate = use_navigate();

    Effect::new(move || {
        let params = query.with_untracked(|q| {
            ExchangeParams::new(q.get("code").as_deref(), q.get("next").as_deref())
        });
        let handler = handler.get_value();
        let navigate = navigate.clone();
        spawn_local(async move {
            let fragment = window().location().hash().ok();
            let backend = BrowserExchange {
                fragment: fragment.as_deref().and_then(parse_fragment),
            };
            match handler.handle(&params, &backend).await {
                // Full navigation drops any cached view rendered before the cookie existed.
                Some(ExchangeOutcome::Success { destination }) => {
                    if let Err(e) = window().location().replace(destination.as_str()) {
                        tracing::warn!(error = ?e, %destination, "Failed to navigate after exchange");
                    }
                }
                Some(ExchangeOutcome::Failure { redirect, notice }) => {
                    toasts.error(notice);
                    navigate(&redirect, Default::default());
                }
                None => {}
            }
        });
    });

    view! {
        <div class="login-page">
            <div class="login-box">
                <p class="loading">"Memverifikasi undangan..."</p>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_fragment() {
        let tokens = parse_fragment("#access_token=abc&expires_in=3600&refresh_token=def&type=invite")
            .expect("tokens");
        assert_eq!(tokens.access_token, "abc");
        assert_eq!(tokens.refresh_token, "def");
        assert_eq!(tokens.expires_in, Some(3600));
    }

    #[test]
    fn incomplete_fragment_is_ignored() {
        assert_eq!(parse_fragment(""), None);
        assert_eq!(parse_fragment("#access_token=abc"), None);
        assert_eq!(parse_fragment("#error=access_denied&error_code=403"), None);
    }
}
