//! Reusable UI components.

pub mod toast;

pub use toast::{ToastKind, ToastQueue, Toaster, Toasts};
