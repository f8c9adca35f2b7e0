#![allow(dead_code)]

use ataraxia_platform_access::Session;
use ataraxia_server::auth::{self, AppState, cookies::SessionCookies};
use ataraxia_server::config::{AuthFlowConfig, SessionConfig};
use ataraxia_testing::FakeBackend;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, header::SET_COOKIE},
    response::Response,
    routing,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

pub const PUBLIC_URL: &str = "https://app.ataraxia.id";

pub fn state_with(backend: &FakeBackend) -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        PUBLIC_URL,
        SessionConfig::default(),
        AuthFlowConfig::default(),
    ))
}

/// The auth routes plus stand-in pages, behind the Route Guard.
pub fn app(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .merge(auth::routes())
        .route("/login", routing::get(|| async { "login" }))
        .route("/dashboard", routing::get(|| async { "dashboard" }))
        .route("/dashboard/team", routing::get(|| async { "team" }))
        .route("/about", routing::get(|| async { "about" }));
    auth::with_route_guard(router, state.clone()).with_state(state)
}

/// `Cookie` header value carrying `session`.
pub fn cookie_header(state: &AppState, session: &Session) -> String {
    SessionCookies::new(&state.session_config)
        .write(&CookieJar::new(), session)
        .expect("encode session")
        .iter()
        .map(|c| format!("{}={}", c.name(), c.value()))
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::empty()).expect("request")
}

pub fn set_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}
