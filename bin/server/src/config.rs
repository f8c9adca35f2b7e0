//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables
//! (`BACKEND__URL`, `SESSION__SECURE_COOKIES`, ...).
//!
//! See [`BackendConfig`](ataraxia_backend::BackendConfig) for the hosted
//! backend connection settings.

use ataraxia_backend::BackendConfig;
use ataraxia_platform_access::{DASHBOARD_PATH, GuardRules, LOGIN_PATH, UPDATE_PASSWORD_PATH};
use chrono::Duration as ChronoDuration;
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Public origin of the application (e.g., "https://app.ataraxia.id").
    /// Used to build absolute redirect and invitation URLs.
    pub public_url: String,

    /// Hosted backend configuration.
    pub backend: BackendConfig,

    /// Session cookie configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Route Guard and invitation flow configuration.
    #[serde(default)]
    pub auth: AuthFlowConfig,
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Name of the session cookie. Chunks are named `{cookie_name}.0`, `.1`, ...
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,

    /// Cookie lifetime in days.
    #[serde(default = "default_cookie_max_age_days")]
    pub cookie_max_age_days: i64,

    /// Sessions expiring within this many seconds are refreshed.
    #[serde(default = "default_refresh_margin_seconds")]
    pub refresh_margin_seconds: i64,

    /// Whether to confirm the access token with the auth service on each request.
    #[serde(default = "default_verify_with_provider")]
    pub verify_with_provider: bool,
}

fn default_cookie_name() -> String {
    "sb-auth-token".to_string()
}

fn default_secure_cookies() -> bool {
    true
}

fn default_cookie_max_age_days() -> i64 {
    400
}

fn default_refresh_margin_seconds() -> i64 {
    60
}

fn default_verify_with_provider() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            secure_cookies: default_secure_cookies(),
            cookie_max_age_days: default_cookie_max_age_days(),
            refresh_margin_seconds: default_refresh_margin_seconds(),
            verify_with_provider: default_verify_with_provider(),
        }
    }
}

impl SessionConfig {
    /// Returns the refresh margin as a duration.
    #[must_use]
    pub fn refresh_margin(&self) -> ChronoDuration {
        ChronoDuration::seconds(self.refresh_margin_seconds)
    }

    /// Name of the PKCE code verifier cookie.
    #[must_use]
    pub fn code_verifier_cookie(&self) -> String {
        format!("{}-code-verifier", self.cookie_name)
    }
}

/// Which exchange handler invitation links point at.
///
/// Invitations issued by an admin carry the session in the URL fragment,
/// which only the browser can read, so links target `/auth/confirm` unless
/// configured otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackVariant {
    /// `GET /auth/callback`, handled before any page renders. Sees `?code=` only.
    Server,
    /// `/auth/confirm`, handled in the browser. Sees `?code=` and `#access_token=`.
    #[default]
    Client,
}

impl CallbackVariant {
    /// Path of the handler.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Server => "/auth/callback",
            Self::Client => "/auth/confirm",
        }
    }
}

/// Route Guard and invitation flow configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthFlowConfig {
    /// Everything at or below this path requires a session.
    #[serde(default = "default_protected_prefix")]
    pub protected_prefix: String,

    /// The sign-in page.
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Where signed-in users land.
    #[serde(default = "default_home_path")]
    pub home_path: String,

    /// Which exchange handler invitation links target.
    #[serde(default)]
    pub callback_variant: CallbackVariant,
}

fn default_protected_prefix() -> String {
    DASHBOARD_PATH.to_string()
}

fn default_login_path() -> String {
    LOGIN_PATH.to_string()
}

fn default_home_path() -> String {
    DASHBOARD_PATH.to_string()
}

impl Default for AuthFlowConfig {
    fn default() -> Self {
        Self {
            protected_prefix: default_protected_prefix(),
            login_path: default_login_path(),
            home_path: default_home_path(),
            callback_variant: CallbackVariant::default(),
        }
    }
}

impl AuthFlowConfig {
    /// Builds the Route Guard rules.
    #[must_use]
    pub fn guard_rules(&self) -> GuardRules {
        GuardRules {
            protected_prefix: self.protected_prefix.clone(),
            login_path: self.login_path.clone(),
            home_path: self.home_path.clone(),
        }
    }

    /// Query string appended to invitation callback URLs.
    #[must_use]
    pub fn invite_query(&self) -> String {
        format!("next={UPDATE_PASSWORD_PATH}")
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.cookie_name, "sb-auth-token");
        assert!(config.secure_cookies);
        assert_eq!(config.cookie_max_age_days, 400);
        assert_eq!(config.refresh_margin(), ChronoDuration::seconds(60));
        assert_eq!(config.code_verifier_cookie(), "sb-auth-token-code-verifier");
    }

    #[test]
    fn auth_flow_defaults() {
        let config = AuthFlowConfig::default();
        assert_eq!(config.guard_rules(), GuardRules::default());
        assert_eq!(config.callback_variant, CallbackVariant::Client);
        assert_eq!(config.callback_variant.path(), "/auth/confirm");
        assert_eq!(config.invite_query(), "next=/update-password");
    }

    #[test]
    fn callback_variant_parses_lowercase() {
        let variant: CallbackVariant = serde_json::from_str("\"server\"").expect("parse");
        assert_eq!(variant, CallbackVariant::Server);
        assert_eq!(variant.path(), "/auth/callback");
    }

    #[test]
    fn loads_nested_sections() {
        let json = r#"{
            "public_url": "https://app.ataraxia.id",
            "backend": {
                "url": "https://example.supabase.co",
                "anon_key": "anon",
                "service_role_key": "service"
            },
            "session": {"secure_cookies": false}
        }"#;
        let config: ServerConfig = serde_json::from_str(json).expect("deserialize");
        assert!(!config.session.secure_cookies);
        assert_eq!(config.session.cookie_name, "sb-auth-token");
        assert_eq!(config.auth.protected_prefix, "/dashboard");
    }
}
