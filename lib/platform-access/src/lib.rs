//! Sessions, roles and access rules for the Ataraxia Phone back office.
//!
//! This crate holds the logic that decides who may see what:
//! - Domain types (`Session`, `User`, `Profile`, `Role`)
//! - The collaborator contracts (`AuthGateway`, `ProfileStore`, `SessionProvider`)
//! - Route Guard decisions (`GuardRules`)
//! - The Role Gate (`authorize`)
//! - Session exchange for invitation links (`SessionExchangeHandler`)
//!
//! Nothing here performs I/O directly, so the same code runs on the server
//! and in the browser.
//!
//! # Example
//!
//! ```
//! use ataraxia_platform_access::{GuardDecision, GuardRules, NextPath};
//!
//! let rules = GuardRules::default();
//! assert!(matches!(
//!     rules.decide(false, "/dashboard/team"),
//!     GuardDecision::Redirect { .. }
//! ));
//!
//! let next = NextPath::from_query(Some("//evil.example"));
//! assert_eq!(next.as_str(), "/dashboard");
//! ```

pub mod error;
pub mod exchange;
pub mod gateway;
pub mod guard;
pub mod profile;
pub mod redirect;
pub mod role;
pub mod session;
pub mod user;

// Re-export main types at crate root
pub use error::{AuthenticationError, StoreError};
pub use exchange::{
    AUTH_CODE_ERROR, ExchangeBackend, ExchangeLatch, ExchangeOutcome, ExchangeParams,
    ExchangeVariant, FAILURE_NOTICE, LatchState, SessionExchangeHandler, VERIFICATION_FAILED,
    login_with_error, run_exchange,
};
pub use gateway::{
    AuthGateway, Invitation, MIN_PASSWORD_LENGTH, validate_invite_email, validate_new_password,
};
pub use guard::{GuardDecision, GuardRules, RedirectReason, is_guarded_path};
pub use profile::{Profile, ProfileStore};
pub use redirect::{DASHBOARD_PATH, LOGIN_PATH, NextPath, UPDATE_PASSWORD_PATH};
pub use role::{Access, DenyReason, Role, authorize};
pub use session::{MAX_EXPIRES_IN, Session, SessionProvider};
pub use user::User;
