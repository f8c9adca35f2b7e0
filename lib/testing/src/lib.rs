//! Test doubles for the Ataraxia Phone workspace.
//!
//! [`FakeBackend`] stands in for the hosted auth and data service. It keeps
//! users, profiles, sessions and one-time codes in memory and counts every
//! call so tests can assert on how often the backend was reached.

mod backend;

pub use backend::FakeBackend;
