//! Page components for the application.
//!
//! Each page is a Leptos component that renders a specific route,
//! along with any server functions specific to that page.

pub mod confirm;
pub mod dashboard;
pub mod login;
pub mod team;
pub mod update_password;

pub use confirm::ConfirmPage;
pub use dashboard::DashboardPage;
pub use login::LoginPage;
pub use team::TeamPage;
pub use update_password::UpdatePasswordPage;
