//! User-facing messages shared by the server and the browser.

pub const SESSION_REQUIRED_MESSAGE: &str = "Sesi tidak ditemukan, silakan login ulang.";

/// Shown when a non-superadmin reaches a superadmin page.
pub const ACCESS_DENIED_MESSAGE: &str = "Akses Ditolak! Halaman ini khusus Superadmin.";

pub const TEAM_LOAD_FAILED_MESSAGE: &str = "Gagal memuat data tim";

pub const SIGN_IN_FAILED_MESSAGE: &str = "Login gagal, periksa email dan password Anda.";

pub const PASSWORD_CREATED_MESSAGE: &str = "Password berhasil dibuat!";

pub const INVITE_SENT_TOAST: &str = "Undangan terkirim! Minta partner cek email.";

/// Explains the `error` query parameter on the sign-in page.
#[must_use]
pub fn login_error_notice(code: &str) -> Option<&'static str> {
    match code {
        "auth-code-error" => Some("Link undangan tidak valid atau sudah kedaluwarsa."),
        "VerificationFailed" => Some("Gagal verifikasi undangan. Silakan minta undangan baru."),
        _ => None,
    }
}
