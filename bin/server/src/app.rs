//! Main Leptos application component and routing.

use crate::components::{Toaster, Toasts};
use crate::pages::{ConfirmPage, DashboardPage, LoginPage, TeamPage, UpdatePasswordPage};
use ataraxia_platform_access::DASHBOARD_PATH;
use leptos::prelude::*;
use leptos_meta::{Title, provide_meta_context};
use leptos_router::{
    components::{Redirect, Route, Router, Routes},
    path,
};

/// The main application component.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();
    Toasts::provide();

    view! {
        <Title text="Ataraxia Phone"/>
        <Router>
            <main class="container">
                <Routes fallback=NotFound>
                    <Route path=path!("/") view=|| view! { <Redirect path=DASHBOARD_PATH/> }/>
                    <Route path=path!("/login") view=LoginPage/>
                    <Route path=path!("/update-password") view=UpdatePasswordPage/>
                    <Route path=path!("/auth/confirm") view=ConfirmPage/>
                    <Route path=path!("/dashboard") view=DashboardPage/>
                    <Route path=path!("/dashboard/team") view=TeamPage/>
                </Routes>
            </main>
            <Toaster/>
        </Router>
    }
}

#[component]
fn NotFound() -> impl IntoView {
    view! {
        <div class="not-found">
            <h1>"Halaman tidak ditemukan"</h1>
            <a href=DASHBOARD_PATH>"Kembali ke dashboard"</a>
        </div>
    }
}
