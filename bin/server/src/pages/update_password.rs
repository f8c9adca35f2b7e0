//! Set-password page, the landing page of invitation links.

use crate::components::{ToastKind, Toasts};
use crate::messages::PASSWORD_CREATED_MESSAGE;
use crate::types::error_message;
use ataraxia_platform_access::{DASHBOARD_PATH, MIN_PASSWORD_LENGTH};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_navigate;

/// Server function to set the signed-in user's password.
#[server]
pub async fn update_password(password: String) -> Result<(), ServerFnError> {
    use crate::auth::account;
    use crate::error::auth_server_error;
    use crate::server_helpers::{app_state, current_session};

    let state = app_state().await?;
    let session = current_session().await?;
    account::update_password(&state, session.as_ref(), &password)
        .await
        .map_err(|e| auth_server_error(&e))?;
    Ok(())
}

/// Set-password form.
#[component]
pub fn UpdatePasswordPage() -> impl IntoView {
    let toasts = Toasts::from_context();
    let navigate = use_navigate();
    let (password, set_password) = signal(String::new());
    let (pending, set_pending) = signal(false);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let password = password.get_untracked();
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            toasts.error(format!("Password minimal {MIN_PASSWORD_LENGTH} karakter"));
            return;
        }
        set_pending.set(true);
        let id = toasts.loading("Menyimpan password...");
        let navigate = navigate.clone();
        spawn_local(async move {
            match update_password(password).await {
                Ok(()) => {
                    toasts.update(id, ToastKind::Success, PASSWORD_CREATED_MESSAGE);
                    navigate(DASHBOARD_PATH, Default::default());
                }
                Err(e) => {
                    toasts.update(id, ToastKind::Error, format!("Gagal: {}", error_message(&e)));
                    set_pending.set(false);
                }
            }
        });
    };

    view! {
        <div class="login-page">
            <div class="login-box">
                <h1>"Buat Password"</h1>
                <p>"Selamat datang! Buat password untuk akun Anda."</p>
                <form on:submit=on_submit>
                    <label for="password">"Password baru"</label>
                    <input
                        id="password"
                        type="password"
                        required
                        minlength=MIN_PASSWORD_LENGTH
                        autocomplete="new-password"
                        prop:value=password
                        on:input=move |ev| set_password.set(event_target_value(&ev))
                    />
                    <button type="submit" class="login-button" disabled=pending>
                        {move || if pending.get() { "Menyimpan..." } else { "Simpan Password" }}
                    </button>
                </form>
            </div>
        </div>
    }
}
