//! Errors raised while setting up the backend client.
//!
//! Request failures are reported through the platform-access error types
//! (`AuthenticationError`, `StoreError`) so callers never see HTTP details.

use std::fmt;

/// Errors from constructing a [`BackendClient`](crate::BackendClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The configured project URL could not be parsed.
    InvalidUrl { url: String, details: String },
    /// The HTTP client could not be built.
    ClientBuild { details: String },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl { url, details } => {
                write!(f, "invalid backend url '{url}': {details}")
            }
            Self::ClientBuild { details } => write!(f, "failed to build http client: {details}"),
        }
    }
}

impl std::error::Error for BackendError {}
