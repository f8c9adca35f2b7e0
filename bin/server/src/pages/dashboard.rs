//! Dashboard shell.

use crate::types::UserInfo;
use crate::user::get_current_user;
use leptos::prelude::*;

/// The dashboard landing page.
#[component]
pub fn DashboardPage() -> impl IntoView {
    let user = Resource::new(|| (), |_| get_current_user());

    view! {
        <div class="dashboard-page">
            <Suspense fallback=move || view! { <p>"Memuat..."</p> }>
                {move || {
                    user.get().map(|result| {
                        match result {
                            Ok(Some(user_info)) => view! {
                                <DashboardContent user_info=user_info/>
                            }.into_any(),
                            Ok(None) => view! {
                                <div>
                                    <p>"Silakan login untuk melanjutkan."</p>
                                    <a href="/login" rel="external" class="cta-button">"Login"</a>
                                </div>
                            }.into_any(),
                            Err(_) => view! {
                                <div>
                                    <p>"Gagal memuat data pengguna. Coba muat ulang halaman."</p>
                                </div>
                            }.into_any(),
                        }
                    })
                }}
            </Suspense>
        </div>
    }
}

#[component]
fn DashboardContent(user_info: UserInfo) -> impl IntoView {
    let greeting = format!("Halo, {}!", user_info.display_name);

    view! {
        <div class="dashboard-content">
            <header class="dashboard-header">
                <h1>{greeting}</h1>
                {(!user_info.role_label.is_empty())
                    .then(|| view! { <span class="role-badge">{user_info.role_label.clone()}</span> })}
            </header>
            <nav class="dashboard-nav">
                <a href="/dashboard">"Beranda"</a>
                {user_info.is_superadmin.then(|| view! { <a href="/dashboard/team">"Kelola Tim"</a> })}
                <a href="/auth/logout" rel="external">"Keluar"</a>
            </nav>
        </div>
    }
}
