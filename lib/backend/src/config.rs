//! Connection settings for the hosted backend.

use secrecy::SecretString;
use serde::Deserialize;

/// Configuration for the hosted auth and data service.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Project URL (e.g., "https://xyzcompany.supabase.co").
    url: String,
    /// Public key sent with every request.
    anon_key: String,
    /// Privileged key, only used to issue invitations.
    service_role_key: SecretString,
    /// Per-request timeout in seconds.
    /// Default: 10
    #[serde(default = "default_request_timeout_seconds")]
    request_timeout_seconds: u64,
}

fn default_request_timeout_seconds() -> u64 {
    10
}

impl BackendConfig {
    /// Creates a configuration with the default timeout.
    #[must_use]
    pub fn new(url: String, anon_key: String, service_role_key: SecretString) -> Self {
        Self {
            url,
            anon_key,
            service_role_key,
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }

    /// Overrides the request timeout.
    #[must_use]
    pub fn with_request_timeout_seconds(mut self, seconds: u64) -> Self {
        self.request_timeout_seconds = seconds;
        self
    }

    /// Returns the project URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the public key.
    #[must_use]
    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// Returns the privileged key.
    #[must_use]
    pub fn service_role_key(&self) -> &SecretString {
        &self.service_role_key
    }

    /// Returns the request timeout in seconds.
    #[must_use]
    pub fn request_timeout_seconds(&self) -> u64 {
        self.request_timeout_seconds
    }
}
