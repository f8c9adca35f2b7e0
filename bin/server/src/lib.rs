//! Ataraxia Phone back-office server and UI.
//!
//! This crate provides the axum server (session cookies, Route Guard,
//! invitation and callback endpoints) and the Leptos pages that drive the
//! sign-in, invitation and team management flows.

#![allow(non_snake_case)]

pub mod app;
pub mod components;
pub mod messages;
pub mod pages;
pub mod types;
pub mod user;

#[cfg(feature = "ssr")]
pub mod auth;
#[cfg(feature = "ssr")]
pub mod config;
#[cfg(feature = "ssr")]
pub mod error;
#[cfg(feature = "ssr")]
pub mod server_helpers;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    use crate::app::App;
    console_error_panic_hook::set_once();
    leptos::mount::hydrate_body(App);
}
