//! Client for the hosted auth and data service.
//!
//! [`BackendClient`] implements [`AuthGateway`](ataraxia_platform_access::AuthGateway)
//! and [`ProfileStore`](ataraxia_platform_access::ProfileStore) over HTTPS.
//! Error responses are mapped onto the platform-access error types; the
//! mapping lives in `wire` and is unit tested without a network.

pub mod client;
pub mod config;
pub mod error;
mod wire;

pub use client::BackendClient;
pub use config::BackendConfig;
pub use error::BackendError;
