mod common;

use ataraxia_platform_access::Role;
use ataraxia_testing::FakeBackend;
use axum::http::StatusCode;
use common::{app, cookie_header, get, location, set_cookies, state_with};
use tower::ServiceExt;

#[tokio::test]
async fn anonymous_protected_request_redirects_to_login() {
    let backend = FakeBackend::new();
    let app = app(state_with(&backend));

    for path in ["/dashboard", "/dashboard/team"] {
        let response = app.clone().oneshot(get(path, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), Some("/login"));
    }
}

#[tokio::test]
async fn signed_in_login_request_redirects_home() {
    let backend = FakeBackend::new();
    let user = backend.add_user("owner@ataraxia.id", "pw", Role::Superadmin);
    let session = backend.issue_session(&user);
    let state = state_with(&backend);
    let cookie = cookie_header(&state, &session);

    let response = app(state).oneshot(get("/login", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/dashboard"));
}

#[tokio::test]
async fn other_requests_pass_through_unchanged() {
    let backend = FakeBackend::new();
    let user = backend.add_user("owner@ataraxia.id", "pw", Role::Superadmin);
    let session = backend.issue_session(&user);
    let state = state_with(&backend);
    let cookie = cookie_header(&state, &session);
    let app = app(state);

    let response = app.clone().oneshot(get("/about", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(response.headers()).is_empty());

    let response = app.clone().oneshot(get("/login", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/dashboard/team", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(response.headers()).is_empty());
}

#[tokio::test]
async fn static_assets_are_not_guarded() {
    let backend = FakeBackend::new();
    let app = app(state_with(&backend));

    for path in ["/pkg/ataraxia.js", "/image/logo.png", "/favicon.ico"] {
        let response = app.clone().oneshot(get(path, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
    }
}

#[tokio::test]
async fn refreshed_session_cookie_is_forwarded() {
    let backend = FakeBackend::new();
    let user = backend.add_user("owner@ataraxia.id", "pw", Role::Superadmin);
    let session = backend.issue_session_expiring_in(&user, 10);
    let state = state_with(&backend);
    let cookie = cookie_header(&state, &session);

    let response = app(state).oneshot(get("/dashboard", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(backend.refresh_calls(), 1);

    let cookies = set_cookies(response.headers());
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("sb-auth-token=base64-"));
    assert!(!cookies[0].contains(&cookie));
}

#[tokio::test]
async fn revoked_session_is_cleared_and_redirected() {
    let backend = FakeBackend::new();
    let user = backend.add_user("owner@ataraxia.id", "pw", Role::Superadmin);
    let session = backend.issue_session(&user);
    backend.revoke_user(&user);
    let state = state_with(&backend);
    let cookie = cookie_header(&state, &session);

    let response = app(state).oneshot(get("/dashboard", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/login"));
    let cookies = set_cookies(response.headers());
    assert!(cookies.iter().any(|c| c.starts_with("sb-auth-token=") && c.contains("Max-Age=0")));
}
