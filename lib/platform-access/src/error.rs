//! Error types for the platform-access crate.
//!
//! - `AuthenticationError`: failures talking to the hosted auth service
//! - `StoreError`: failures reading the `profiles` table

use std::fmt;

/// Errors from authentication operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// The email/password pair was rejected.
    InvalidCredentials,
    /// An email address is required but was empty or missing.
    EmailRequired,
    /// The operation needs an active session and there is none.
    NotAuthenticated,
    /// A user with this email already exists.
    DuplicateUser { email: String },
    /// A one-time code could not be exchanged (invalid, expired or consumed).
    InvalidCode { reason: String },
    /// The new password is shorter than the minimum length.
    PasswordTooShort { min_length: usize },
    /// The auth service reported an error not covered above.
    Provider { status: u16, message: String },
    /// The auth service could not be reached.
    Transport { details: String },
    /// The auth service answered with something we could not decode.
    InvalidResponse { details: String },
}

impl AuthenticationError {
    /// Message safe to show to the person using the app.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Login gagal, periksa email dan password Anda.".to_string(),
            Self::EmailRequired => "Email wajib diisi".to_string(),
            Self::NotAuthenticated => "Sesi tidak ditemukan, silakan login ulang.".to_string(),
            Self::DuplicateUser { email } => format!("Email {email} sudah terdaftar"),
            Self::InvalidCode { .. } => {
                "Kode verifikasi tidak valid atau sudah digunakan.".to_string()
            }
            Self::PasswordTooShort { min_length } => {
                format!("Password minimal {min_length} karakter")
            }
            Self::Provider { message, .. } => message.clone(),
            Self::Transport { .. } => "Layanan tidak dapat dihubungi, coba lagi nanti.".to_string(),
            Self::InvalidResponse { .. } => "Terjadi kesalahan pada layanan.".to_string(),
        }
    }
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid login credentials"),
            Self::EmailRequired => write!(f, "email is required"),
            Self::NotAuthenticated => write!(f, "not authenticated"),
            Self::DuplicateUser { email } => write!(f, "user '{email}' already exists"),
            Self::InvalidCode { reason } => write!(f, "invalid one-time code: {reason}"),
            Self::PasswordTooShort { min_length } => {
                write!(f, "password must be at least {min_length} characters")
            }
            Self::Provider { status, message } => {
                write!(f, "auth service error ({status}): {message}")
            }
            Self::Transport { details } => write!(f, "auth service unreachable: {details}"),
            Self::InvalidResponse { details } => {
                write!(f, "invalid auth service response: {details}")
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Errors from reading profile rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The caller's token was rejected by the data service.
    Unauthorized,
    /// The data service answered with an error status.
    Request { status: u16, message: String },
    /// The data service could not be reached.
    Transport { details: String },
    /// A row could not be decoded.
    Decode { details: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "data service rejected the session token"),
            Self::Request { status, message } => {
                write!(f, "data service error ({status}): {message}")
            }
            Self::Transport { details } => write!(f, "data service unreachable: {details}"),
            Self::Decode { details } => write!(f, "failed to decode row: {details}"),
        }
    }
}

impl std::error::Error for StoreError {}
