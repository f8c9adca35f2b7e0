//! Session exchange for invitation and magic links.
//!
//! An inbound link carries either a one-time `code` or, when the provider
//! already attached the session itself, nothing but the `next` destination.
//! Both the server-executed handler and the in-browser handler run the same
//! state machine:
//!
//! ```text
//! Start ──code──▶ Exchanging ──ok──▶ Terminal(Success)
//!   │                  │
//!   │ no code          │ failed
//!   ▼                  ▼
//! CheckingSession ──session──▶ Terminal(Success)
//!   │
//!   └──none──▶ Terminal(Failure)
//! ```
//!
//! A one-time code is single use, so the handler is wrapped in an
//! [`ExchangeLatch`] that lets the exchange start at most once per page
//! instance no matter how often setup code is re-run.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use crate::redirect::{LOGIN_PATH, NextPath};

/// Error indicator used by the server-executed handler.
pub const AUTH_CODE_ERROR: &str = "auth-code-error";

/// Error indicator used by the in-browser handler.
pub const VERIFICATION_FAILED: &str = "VerificationFailed";

/// Notification shown when verification fails.
pub const FAILURE_NOTICE: &str = "Gagal verifikasi undangan.";

/// Builds the sign-in URL carrying an error indicator.
#[must_use]
pub fn login_with_error(code: &str) -> String {
    format!("{LOGIN_PATH}?error={code}")
}

/// Where the handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangeVariant {
    /// Before any page renders, as an HTTP redirect handler.
    #[default]
    Server,
    /// In the browser after an initial blank render.
    Client,
}

impl ExchangeVariant {
    /// Where a failed exchange sends the user.
    #[must_use]
    pub fn failure_redirect(self) -> String {
        match self {
            Self::Server => login_with_error(AUTH_CODE_ERROR),
            Self::Client => login_with_error(VERIFICATION_FAILED),
        }
    }
}

/// The parts of the inbound URL the handler reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeParams {
    code: Option<String>,
    next: NextPath,
}

impl ExchangeParams {
    /// Builds the parameters from raw query values.
    ///
    /// An empty code counts as absent; `next` is validated.
    #[must_use]
    pub fn new(code: Option<&str>, next: Option<&str>) -> Self {
        Self {
            code: code
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            next: NextPath::from_query(next),
        }
    }

    /// Returns the one-time code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Returns the destination after success.
    #[must_use]
    pub fn next(&self) -> &NextPath {
        &self.next
    }
}

/// How an exchange ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// A session is in place; go to `destination`.
    Success { destination: NextPath },
    /// No session could be established.
    Failure {
        redirect: String,
        notice: &'static str,
    },
}

impl ExchangeOutcome {
    /// Returns the URL the user should be sent to.
    #[must_use]
    pub fn location(&self) -> &str {
        match self {
            Self::Success { destination } => destination.as_str(),
            Self::Failure { redirect, .. } => redirect,
        }
    }

    /// Returns true on success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// The two questions the state machine asks of the outside world.
pub trait ExchangeBackend {
    /// Trades a one-time code for a session and persists it.
    ///
    /// Resolves to `true` if a session was stored.
    fn exchange_code(&self, code: &str) -> impl Future<Output = bool>;

    /// Resolves to `true` if a session is already present.
    fn has_session(&self) -> impl Future<Output = bool>;
}

#[derive(Debug)]
enum ExchangeState {
    Start,
    Exchanging(String),
    CheckingSession,
    Terminal(ExchangeOutcome),
}

/// Runs the exchange state machine to completion.
pub async fn run_exchange<B>(
    params: &ExchangeParams,
    variant: ExchangeVariant,
    backend: &B,
) -> ExchangeOutcome
where
    B: ExchangeBackend + ?Sized,
{
    let mut state = ExchangeState::Start;
    loop {
        state = match state {
            ExchangeState::Start => match params.code() {
                Some(code) => ExchangeState::Exchanging(code.to_string()),
                None => ExchangeState::CheckingSession,
            },
            ExchangeState::Exchanging(code) => {
                if backend.exchange_code(&code).await {
                    ExchangeState::Terminal(ExchangeOutcome::Success {
                        destination: params.next().clone(),
                    })
                } else {
                    tracing::debug!(?variant, "code exchange failed, checking for a session");
                    ExchangeState::CheckingSession
                }
            }
            ExchangeState::CheckingSession => {
                if backend.has_session().await {
                    ExchangeState::Terminal(ExchangeOutcome::Success {
                        destination: params.next().clone(),
                    })
                } else {
                    ExchangeState::Terminal(ExchangeOutcome::Failure {
                        redirect: variant.failure_redirect(),
                        notice: FAILURE_NOTICE,
                    })
                }
            }
            ExchangeState::Terminal(outcome) => {
                match &outcome {
                    ExchangeOutcome::Success { destination } => {
                        tracing::debug!(?variant, destination = %destination, "session exchange succeeded");
                    }
                    ExchangeOutcome::Failure { redirect, .. } => {
                        tracing::warn!(?variant, redirect = %redirect, "session exchange failed");
                    }
                }
                return outcome;
            }
        };
    }
}

/// Progress of the one exchange a page instance may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LatchState {
    #[default]
    NotStarted,
    InFlight,
    Done,
}

/// One-shot latch scoped to a page instance or request.
#[derive(Debug, Default)]
pub struct ExchangeLatch {
    state: Mutex<LatchState>,
}

impl ExchangeLatch {
    /// Creates a latch in the `NotStarted` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `NotStarted` to `InFlight`.
    ///
    /// Returns false if the exchange was already started.
    pub fn try_begin(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == LatchState::NotStarted {
            *state = LatchState::InFlight;
            true
        } else {
            false
        }
    }

    /// Marks the exchange as finished.
    pub fn finish(&self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = LatchState::Done;
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> LatchState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A latched exchange handler.
#[derive(Debug)]
pub struct SessionExchangeHandler {
    variant: ExchangeVariant,
    latch: ExchangeLatch,
}

impl SessionExchangeHandler {
    /// Creates a handler with a fresh latch.
    #[must_use]
    pub fn new(variant: ExchangeVariant) -> Self {
        Self {
            variant,
            latch: ExchangeLatch::new(),
        }
    }

    /// Returns the variant.
    #[must_use]
    pub fn variant(&self) -> ExchangeVariant {
        self.variant
    }

    /// Returns the latch state.
    #[must_use]
    pub fn state(&self) -> LatchState {
        self.latch.state()
    }

    /// Runs the exchange unless it already ran.
    ///
    /// Returns `None` for every call after the first.
    pub async fn handle<B>(&self, params: &ExchangeParams, backend: &B) -> Option<ExchangeOutcome>
    where
        B: ExchangeBackend + ?Sized,
    {
        if !self.latch.try_begin() {
            tracing::debug!(state = ?self.latch.state(), "exchange already started, ignoring");
            return None;
        }
        let outcome = run_exchange(params, self.variant, backend).await;
        self.latch.finish();
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect::UPDATE_PASSWORD_PATH;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        exchange_ok: bool,
        session_present: bool,
        exchanges: AtomicUsize,
        session_checks: AtomicUsize,
    }

    impl Scripted {
        fn new(exchange_ok: bool, session_present: bool) -> Self {
            Self {
                exchange_ok,
                session_present,
                exchanges: AtomicUsize::new(0),
                session_checks: AtomicUsize::new(0),
            }
        }
    }

    impl ExchangeBackend for Scripted {
        async fn exchange_code(&self, _code: &str) -> bool {
            self.exchanges.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.exchange_ok
        }

        async fn has_session(&self) -> bool {
            self.session_checks.fetch_add(1, Ordering::SeqCst);
            self.session_present
        }
    }

    #[tokio::test]
    async fn valid_code_redirects_to_next() {
        let backend = Scripted::new(true, false);
        let params = ExchangeParams::new(Some("abc"), Some(UPDATE_PASSWORD_PATH));
        let outcome = run_exchange(&params, ExchangeVariant::Server, &backend).await;

        assert_eq!(outcome.location(), "/update-password");
        assert_eq!(backend.exchanges.load(Ordering::SeqCst), 1);
        assert_eq!(backend.session_checks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_code_falls_back_to_existing_session() {
        let backend = Scripted::new(false, true);
        let params = ExchangeParams::new(Some("used"), None);
        let outcome = run_exchange(&params, ExchangeVariant::Client, &backend).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.location(), "/dashboard");
        assert_eq!(backend.session_checks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_code_and_no_session_fails_per_variant() {
        let backend = Scripted::new(true, false);
        let params = ExchangeParams::new(None, Some("/update-password"));

        let server = run_exchange(&params, ExchangeVariant::Server, &backend).await;
        assert_eq!(
            server,
            ExchangeOutcome::Failure {
                redirect: "/login?error=auth-code-error".to_string(),
                notice: FAILURE_NOTICE,
            }
        );

        let client = run_exchange(&params, ExchangeVariant::Client, &backend).await;
        assert_eq!(client.location(), "/login?error=VerificationFailed");
        assert_eq!(backend.exchanges.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn consumed_code_without_session_fails_once() {
        let backend = Scripted::new(false, false);
        let handler = SessionExchangeHandler::new(ExchangeVariant::Client);
        let params = ExchangeParams::new(Some("consumed"), None);

        let outcome = handler.handle(&params, &backend).await.expect("first run");
        assert!(!outcome.is_success());
        assert!(handler.handle(&params, &backend).await.is_none());
        assert_eq!(backend.exchanges.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_invocations_exchange_once() {
        let backend = Scripted::new(true, false);
        let handler = SessionExchangeHandler::new(ExchangeVariant::Client);
        let params = ExchangeParams::new(Some("abc"), Some(UPDATE_PASSWORD_PATH));

        let (first, second) = futures::join!(
            handler.handle(&params, &backend),
            handler.handle(&params, &backend)
        );

        let outcomes: Vec<_> = [first, second].into_iter().flatten().collect();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].location(), "/update-password");
        assert_eq!(backend.exchanges.load(Ordering::SeqCst), 1);
        assert_eq!(handler.state(), LatchState::Done);
    }

    #[test]
    fn latch_transitions() {
        let latch = ExchangeLatch::new();
        assert_eq!(latch.state(), LatchState::NotStarted);
        assert!(latch.try_begin());
        assert_eq!(latch.state(), LatchState::InFlight);
        assert!(!latch.try_begin());
        latch.finish();
        assert_eq!(latch.state(), LatchState::Done);
        assert!(!latch.try_begin());
    }

    #[test]
    fn params_ignore_blank_code_and_bad_next() {
        let params = ExchangeParams::new(Some(" "), Some("https://evil.example"));
        assert!(params.code().is_none());
        assert_eq!(params.next().as_str(), "/dashboard");
    }
}
