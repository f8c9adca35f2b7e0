//! Redirect destinations carried through invitation links.

use std::fmt;

/// Default landing page after authentication.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// The sign-in page.
pub const LOGIN_PATH: &str = "/login";

/// Where invited users set their password.
pub const UPDATE_PASSWORD_PATH: &str = "/update-password";

/// A validated same-origin path.
///
/// Only paths that start with a single `/` are accepted. Protocol-relative
/// forms (`//host`, `/\host`), backslashes, control characters and anything
/// carrying a scheme are rejected, so the value can be appended to the
/// application origin without leaving it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NextPath(String);

impl NextPath {
    /// Validates a raw path.
    ///
    /// Returns `None` if the path could leave the application origin.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut chars = raw.chars();
        if chars.next() != Some('/') {
            return None;
        }
        if matches!(chars.next(), Some('/' | '\\')) {
            return None;
        }
        if raw.chars().any(|c| c == '\\' || c.is_control()) {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    /// Resolves the `next` query parameter, falling back to the dashboard.
    #[must_use]
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") => Self::dashboard(),
            Some(raw) => Self::parse(raw).unwrap_or_else(|| {
                tracing::warn!(next = %raw.escape_debug(), "rejected redirect destination");
                Self::dashboard()
            }),
        }
    }

    /// The dashboard path.
    #[must_use]
    pub fn dashboard() -> Self {
        Self(DASHBOARD_PATH.to_string())
    }

    /// Returns the path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Joins the path onto an origin such as `https://app.example`.
    #[must_use]
    pub fn absolute(&self, origin: &str) -> String {
        format!("{}{}", origin.trim_end_matches('/'), self.0)
    }
}

impl Default for NextPath {
    fn default() -> Self {
        Self::dashboard()
    }
}

impl fmt::Display for NextPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NextPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
