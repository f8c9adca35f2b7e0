//! Login page component.

use crate::messages::{SIGN_IN_FAILED_MESSAGE, login_error_notice};
use crate::types::error_message;
use ataraxia_platform_access::DASHBOARD_PATH;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_query_map;

/// Server function to sign in with email and password.
///
/// On success the session cookies are set on the response.
#[server]
pub async fn sign_in(email: String, password: String) -> Result<(), ServerFnError> {
    use crate::auth::account;
    use crate::error::auth_server_error;
    use crate::server_helpers::{app_state, persist_session};

    let state = app_state().await?;
    let session = account::sign_in(&state, &email, &password)
        .await
        .map_err(|e| auth_server_error(&e))?;
    persist_session(&state, &session)
        .await
        .map_err(|e| e.into_server_error())?;
    Ok(())
}

/// Login page with an email and password form.
#[component]
pub fn LoginPage() -> impl IntoView {
    let query = use_query_map();
    let notice = move || {
        query
            .read()
            .get("error")
            .and_then(|code| login_error_notice(&code))
    };

    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (error, set_error) = signal(Option::<String>::None);
    let (pending, set_pending) = signal(false);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        set_pending.set(true);
        set_error.set(None);
        let (email, password) = (email.get_untracked(), password.get_untracked());
        spawn_local(async move {
            match sign_in(email, password).await {
                // Full navigation so the Route Guard sees the new cookie.
                Ok(()) => {
                    if let Err(e) = window().location().set_href(DASHBOARD_PATH) {
                        tracing::warn!(error = ?e, "Failed to navigate after sign-in");
                    }
                }
                Err(e) => {
                    let message = error_message(&e);
                    set_error.set(Some(if message.is_empty() {
                        SIGN_IN_FAILED_MESSAGE.to_string()
                    } else {
                        message
                    }));
                    set_pending.set(false);
                }
            }
        });
    };

    view! {
        <div class="login-page">
            <div class="login-box">
                <h1>"Ataraxia Phone"</h1>
                <p>"Masuk ke panel admin."</p>
                {move || notice().map(|text| view! { <p class="notice notice-error">{text}</p> })}
                <form on:submit=on_submit>
                    <label for="email">"Email"</label>
                    <input
                        id="email"
                        type="email"
                        required
                        autocomplete="email"
                        prop:value=email
                        on:input=move |ev| set_email.set(event_target_value(&ev))
                    />
                    <label for="password">"Password"</label>
                    <input
                        id="password"
                        type="password"
                        required
                        autocomplete="current-password"
                        prop:value=password
                        on:input=move |ev| set_password.set(event_target_value(&ev))
                    />
                    {move || error.get().map(|msg| view! { <p class="form-error">{msg}</p> })}
                    <button type="submit" class="login-button" disabled=pending>
                        {move || if pending.get() { "Memproses..." } else { "Masuk" }}
                    </button>
                </form>
            </div>
        </div>
    }
}
