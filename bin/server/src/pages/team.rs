//! Team management page, restricted to superadmins.

use crate::components::Toasts;
use crate::messages::{ACCESS_DENIED_MESSAGE, INVITE_SENT_TOAST, TEAM_LOAD_FAILED_MESSAGE};
use crate::types::{TeamMember, TeamView, error_message};
use ataraxia_platform_access::DASHBOARD_PATH;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_navigate;

/// Server function to load the team listing behind the Role Gate.
#[server]
pub async fn load_team() -> Result<TeamView, ServerFnError> {
    use crate::auth::role_gate::{self, TeamAccess};
    use crate::error::TeamError;
    use crate::server_helpers::{app_state, current_session};

    let state = app_state().await?;
    let session = current_session().await?;
    let access = role_gate::load_team(&state, session.as_ref())
        .await
        .map_err(|report| {
            tracing::error!(error = %report.current_context(), "Failed to load team");
            TeamError::LoadFailed {
                details: report.current_context().to_string(),
            }
            .into_server_error()
        })?;

    Ok(match access {
        TeamAccess::Anonymous => TeamView::Anonymous,
        TeamAccess::Denied(_) => TeamView::Denied,
        TeamAccess::Granted(profiles) => {
            TeamView::Members(profiles.iter().map(TeamMember::from).collect())
        }
    })
}

/// Server function to invite a partner by email.
#[server]
pub async fn send_invite(email: String) -> Result<(), ServerFnError> {
    use crate::auth::invite::invite;
    use crate::server_helpers::{app_state, current_session};

    let state = app_state().await?;
    let session = current_session().await?;
    invite(&state, session.as_ref(), Some(&email))
        .await
        .map_err(|e| e.into_server_error())?;
    Ok(())
}

/// Message shown when the listing cannot be loaded.
///
/// Server errors already carry a user-facing message; anything else (the
/// request never reached the server) gets the generic one.
fn load_failure_notice(error: &ServerFnError) -> String {
    match error {
        ServerFnError::ServerError(message) if !message.is_empty() => message.clone(),
        _ => TEAM_LOAD_FAILED_MESSAGE.to_string(),
    }
}

/// Team listing and invite form.
#[component]
pub fn TeamPage() -> impl IntoView {
    let toasts = Toasts::from_context();
    let navigate = use_navigate();
    let team = Resource::new(|| (), |_| load_team());

    // Denied callers are sent back before anything privileged renders.
    Effect::new(move || match team.get() {
        Some(Ok(TeamView::Denied)) => {
            toasts.error(ACCESS_DENIED_MESSAGE);
            navigate(DASHBOARD_PATH, Default::default());
        }
        Some(Err(e)) => {
            toasts.error(load_failure_notice(&e));
        }
        _ => {}
    });

    view! {
        <div class="team-page">
            <h1>"Kelola Tim"</h1>
            <Suspense fallback=move || view! { <p>"Memuat..."</p> }>
                {move || {
                    team.get().map(|result| {
                        match result {
                            Ok(TeamView::Members(members)) => view! {
                                <InviteForm on_sent=move || team.refetch()/>
                                <TeamTable members=members/>
                            }.into_any(),
                            Ok(TeamView::Denied | TeamView::Anonymous) => view! { <div></div> }.into_any(),
                            Err(_) => view! {
                                <p class="form-error">{TEAM_LOAD_FAILED_MESSAGE}</p>
                            }.into_any(),
                        }
                    })
                }}
            </Suspense>
        </div>
    }
}

#[component]
fn TeamTable(members: Vec<TeamMember>) -> impl IntoView {
    view! {
        <table class="team-table">
            <thead>
                <tr>
                    <th>"Nama"</th>
                    <th>"Email"</th>
                    <th>"Role"</th>
                </tr>
            </thead>
            <tbody>
                {members.into_iter().map(|member| {
                    let badge = if member.is_superadmin { "role-badge role-superadmin" } else { "role-badge" };
                    view! {
                        <tr>
                            <td>{member.name}</td>
                            <td>{member.email}</td>
                            <td><span class=badge>{member.role_label}</span></td>
                        </tr>
                    }
                }).collect_view()}
            </tbody>
        </table>
    }
}

#[component]
fn InviteForm(on_sent: impl Fn() + Copy + 'static) -> impl IntoView {
    let toasts = Toasts::from_context();
    let (email, set_email) = signal(String::new());
    let (pending, set_pending) = signal(false);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        set_pending.set(true);
        let address = email.get_untracked();
        spawn_local(async move {
            match send_invite(address).await {
                Ok(()) => {
                    toasts.success(INVITE_SENT_TOAST);
                    set_email.set(String::new());
                    on_sent();
                }
                Err(e) => {
                    toasts.error(error_message(&e));
                }
            }
            set_pending.set(false);
        });
    };

    view! {
        <form class="invite-form" on:submit=on_submit>
            <label for="invite-email">"Undang partner"</label>
            <input
                id="invite-email"
                type="email"
                placeholder="email@contoh.com"
                prop:value=email
                on:input=move |ev| set_email.set(event_target_value(&ev))
            />
            <button type="submit" disabled=pending>
                {move || if pending.get() { "Mengirim..." } else { "Kirim Undangan" }}
            </button>
        </form>
    }
}
