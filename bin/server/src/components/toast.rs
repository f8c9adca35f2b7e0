//! Transient notifications.
//!
//! [`ToastQueue`] holds the state; [`Toasts`] puts it in a signal shared
//! through context, and [`Toaster`] renders it.

use leptos::prelude::*;
use std::time::Duration;

/// How long success and error toasts stay on screen.
const AUTO_DISMISS: Duration = Duration::from_secs(4);

/// Kind of notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToastKind {
    Success,
    Error,
    Loading,
}

impl ToastKind {
    fn class(self) -> &'static str {
        match self {
            Self::Success => "toast toast-success",
            Self::Error => "toast toast-error",
            Self::Loading => "toast toast-loading",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
}

/// Ordered list of visible toasts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToastQueue {
    next_id: u64,
    toasts: Vec<Toast>,
}

impl ToastQueue {
    /// Adds a toast and returns its id.
    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) -> u64 {
        self.next_id += 1;
        self.toasts.push(Toast {
            id: self.next_id,
            kind,
            message: message.into(),
        });
        self.next_id
    }

    /// Replaces a toast in place. Returns false if it is gone.
    pub fn update(&mut self, id: u64, kind: ToastKind, message: impl Into<String>) -> bool {
        match self.toasts.iter_mut().find(|t| t.id == id) {
            Some(toast) => {
                toast.kind = kind;
                toast.message = message.into();
                true
            }
            None => false,
        }
    }

    pub fn dismiss(&mut self, id: u64) {
        self.toasts.retain(|t| t.id != id);
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }
}

/// Handle to the shared toast queue.
#[derive(Clone, Copy)]
pub struct Toasts {
    queue: RwSignal<ToastQueue>,
}

impl Toasts {
    /// Creates the queue and provides it to descendants.
    pub fn provide() -> Self {
        let toasts = Self {
            queue: RwSignal::new(ToastQueue::default()),
        };
        provide_context(toasts);
        toasts
    }

    /// Gets the queue provided by an ancestor.
    pub fn from_context() -> Self {
        expect_context::<Self>()
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.show(ToastKind::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.show(ToastKind::Error, message)
    }

    /// Shows a loading toast that stays until updated or dismissed.
    pub fn loading(&self, message: impl Into<String>) -> u64 {
        let message = message.into();
        self.queue
            .try_update(|q| q.push(ToastKind::Loading, message))
            .unwrap_or_default()
    }

    /// Turns an existing toast into another kind, e.g. loading into success.
    pub fn update(&self, id: u64, kind: ToastKind, message: impl Into<String>) {
        let message = message.into();
        let updated = self
            .queue
            .try_update(|q| q.update(id, kind, message.clone()))
            .unwrap_or(false);
        if !updated {
            self.show(kind, message);
        } else if kind != ToastKind::Loading {
            self.dismiss_later(id);
        }
    }

    pub fn dismiss(&self, id: u64) {
        self.queue.update(|q| q.dismiss(id));
    }

    fn show(&self, kind: ToastKind, message: impl Into<String>) -> u64 {
        let message = message.into();
        let id = self
            .queue
            .try_update(|q| q.push(kind, message))
            .unwrap_or_default();
        self.dismiss_later(id);
        id
    }

    fn dismiss_later(&self, id: u64) {
        let queue = self.queue;
        set_timeout(
            move || {
                queue.try_update(|q| q.dismiss(id));
            },
            AUTO_DISMISS,
        );
    }
}

/// Renders the toast stack.
#[component]
pub fn Toaster() -> impl IntoView {
    let toasts = Toasts::from_context();

    view! {
        <div class="toaster" role="status" aria-live="polite">
            <For
                each=move || toasts.queue.with(|q| q.toasts().to_vec())
                key=|toast| (toast.id, toast.kind, toast.message.clone())
                let:toast
            >
                <div class=toast.kind.class()>
                    <span class="toast-message">{toast.message.clone()}</span>
                    <button
                        class="toast-dismiss"
                        aria-label="Tutup"
                        on:click=move |_| toasts.dismiss(toast.id)
                    >
                        "×"
                    </button>
                </div>
            </For>
        </div>
    }
}
