//! Authentication and access control for the Ataraxia server.
//!
//! This module provides:
//! - Cookie-backed sessions ([`cookies`], [`resolver`])
//! - The Route Guard middleware and session extractors ([`middleware`])
//! - The server-executed session exchange and sign-out ([`routes`])
//! - Invitation issuance ([`invite`])
//! - Account operations backing the Leptos server functions ([`account`])
//! - The Role Gate for superadmin pages ([`role_gate`])
//!
//! # Session Model
//!
//! Sessions live entirely in the browser cookie jar. Nothing is stored
//! server-side; each request re-derives its session from the cookies and,
//! unless disabled, confirms it with the hosted auth service. Expiring
//! tokens are refreshed on the way through and the new cookie is written on
//! the response.

pub mod account;
pub mod cookies;
pub mod invite;
pub mod middleware;
pub mod resolver;
pub mod role_gate;
pub mod routes;

use ataraxia_platform_access::{AuthGateway, ProfileStore};
use axum::{
    Router,
    extract::FromRef,
    routing::{get, post},
};
use std::sync::Arc;

use crate::config::{AuthFlowConfig, SessionConfig};

pub use middleware::{CurrentSession, OptionalSession, route_guard};
pub use resolver::{CookieSessionProvider, CookieUpdate, Resolution};
pub use routes::{callback, logout};

/// Shared application state.
pub struct AppState {
    /// Account operations against the auth service.
    pub gateway: Arc<dyn AuthGateway>,
    /// Profile reads.
    pub profiles: Arc<dyn ProfileStore>,
    /// Public origin used for absolute redirects.
    pub public_url: String,
    /// Session cookie configuration.
    pub session_config: SessionConfig,
    /// Route Guard and invitation flow configuration.
    pub flow: AuthFlowConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        gateway: Arc<dyn AuthGateway>,
        profiles: Arc<dyn ProfileStore>,
        public_url: impl Into<String>,
        session_config: SessionConfig,
        flow: AuthFlowConfig,
    ) -> Self {
        Self {
            gateway,
            profiles,
            public_url: public_url.into().trim_end_matches('/').to_string(),
            session_config,
            flow,
        }
    }
}

/// HTTP routes owned by this module.
pub fn routes<S>() -> Router<S>
where
    Arc<AppState>: FromRef<S>,
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/auth/callback", get(routes::callback))
        .route("/auth/logout", get(routes::logout))
        .route("/api/invite", post(invite::issue_invite))
}

/// Wraps `router` in the Route Guard.
pub fn with_route_guard<S>(router: Router<S>, state: Arc<AppState>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(axum::middleware::from_fn_with_state(state, route_guard))
}
