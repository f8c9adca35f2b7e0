//! Core domain types for the Ataraxia Phone back office.
//!
//! This crate provides the identifier types shared across the workspace.

pub mod id;

pub use id::{ParseIdError, UserId};
