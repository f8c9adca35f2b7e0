//! Route Guard decisions.
//!
//! The guard runs before every navigable request. It only needs two facts,
//! whether a session is present and which path was requested, so the
//! decision is a pure function the server middleware wraps.

use crate::redirect::{DASHBOARD_PATH, LOGIN_PATH};

/// Path prefixes that are never guarded.
const UNGUARDED_PREFIXES: &[&str] = &["/pkg/", "/image/", "/favicon.ico"];

/// File extensions that are never guarded.
const UNGUARDED_EXTENSIONS: &[&str] = &["svg", "png", "jpg", "jpeg", "gif", "webp"];

/// Which paths are protected and where to send people.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRules {
    /// Everything at or below this path requires a session.
    pub protected_prefix: String,
    /// The sign-in page.
    pub login_path: String,
    /// Where signed-in users land.
    pub home_path: String,
}

impl Default for GuardRules {
    fn default() -> Self {
        Self {
            protected_prefix: DASHBOARD_PATH.to_string(),
            login_path: LOGIN_PATH.to_string(),
            home_path: DASHBOARD_PATH.to_string(),
        }
    }
}

/// What the guard wants done with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Let the request through.
    PassThrough,
    /// Redirect elsewhere.
    Redirect {
        location: String,
        reason: RedirectReason,
    },
}

/// Why the guard redirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    /// Anonymous request for a protected page.
    Unauthenticated,
    /// Signed-in request for the sign-in page.
    AlreadySignedIn,
}

impl GuardRules {
    /// Returns true if `path` lies in the protected area.
    #[must_use]
    pub fn is_protected(&self, path: &str) -> bool {
        let prefix = self.protected_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return true;
        }
        match path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Returns true if `path` is the sign-in page.
    #[must_use]
    pub fn is_login(&self, path: &str) -> bool {
        path == self.login_path
    }

    /// Applies the decision table.
    #[must_use]
    pub fn decide(&self, has_session: bool, path: &str) -> GuardDecision {
        if !has_session && self.is_protected(path) {
            return GuardDecision::Redirect {
                location: self.login_path.clone(),
                reason: RedirectReason::Unauthenticated,
            };
        }
        if has_session && self.is_login(path) {
            return GuardDecision::Redirect {
                location: self.home_path.clone(),
                reason: RedirectReason::AlreadySignedIn,
            };
        }
        GuardDecision::PassThrough
    }
}

/// Returns true if the guard should look at `path` at all.
///
/// Build artifacts, the favicon, the public image directory and image files
/// are skipped.
#[must_use]
pub fn is_guarded_path(path: &str) -> bool {
    if UNGUARDED_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
    {
        return false;
    }
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((_, ext)) => !UNGUARDED_EXTENSIONS
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext)),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_protected_request_goes_to_login() {
        let rules = GuardRules::default();
        for path in ["/dashboard", "/dashboard/", "/dashboard/team"] {
            assert_eq!(
                rules.decide(false, path),
                GuardDecision::Redirect {
                    location: "/login".to_string(),
                    reason: RedirectReason::Unauthenticated,
                },
                "{path}"
            );
        }
    }

    #[test]
    fn signed_in_login_request_goes_home() {
        let rules = GuardRules::default();
        assert_eq!(
            rules.decide(true, "/login"),
            GuardDecision::Redirect {
                location: "/dashboard".to_string(),
                reason: RedirectReason::AlreadySignedIn,
            }
        );
    }

    #[test]
    fn everything_else_passes() {
        let rules = GuardRules::default();
        assert_eq!(rules.decide(true, "/dashboard/team"), GuardDecision::PassThrough);
        assert_eq!(rules.decide(false, "/login"), GuardDecision::PassThrough);
        assert_eq!(rules.decide(false, "/update-password"), GuardDecision::PassThrough);
        assert_eq!(rules.decide(false, "/auth/callback"), GuardDecision::PassThrough);
        assert_eq!(rules.decide(true, "/login/help"), GuardDecision::PassThrough);
    }

    #[test]
    fn protected_prefix_respects_segments() {
        let rules = GuardRules::default();
        assert!(!rules.is_protected("/dashboards"));
        assert!(!rules.is_protected("/"));
        assert!(rules.is_protected("/dashboard/phone/add"));
    }

    #[test]
    fn static_assets_are_not_guarded() {
        assert!(!is_guarded_path("/pkg/ataraxia.wasm"));
        assert!(!is_guarded_path("/favicon.ico"));
        assert!(!is_guarded_path("/image/logo.svg"));
        assert!(!is_guarded_path("/dashboard/banner.PNG"));
        assert!(is_guarded_path("/dashboard"));
        assert!(is_guarded_path("/login"));
        assert!(is_guarded_path("/api/invite"));
    }
}
