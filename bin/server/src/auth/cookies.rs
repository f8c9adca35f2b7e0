//! Session cookie layout.
//!
//! The session is stored as `base64-` followed by the URL-safe base64 of its
//! JSON form. Values longer than [`MAX_CHUNK_SIZE`] are split across
//! `{name}.0`, `{name}.1`, ... and reassembled on read.

use ataraxia_platform_access::Session;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::fmt;
use time::Duration as TimeDuration;

use crate::config::SessionConfig;

/// Largest cookie value written before splitting into chunks.
pub const MAX_CHUNK_SIZE: usize = 3180;

/// Prefix marking a base64-encoded value.
const BASE64_PREFIX: &str = "base64-";

/// Errors reading the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieError {
    /// The value is not valid base64.
    Encoding { details: String },
    /// The decoded value is not a session.
    Format { details: String },
}

impl fmt::Display for CookieError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encoding { details } => write!(f, "invalid cookie encoding: {details}"),
            Self::Format { details } => write!(f, "invalid session cookie: {details}"),
        }
    }
}

impl std::error::Error for CookieError {}

/// Reads and writes the session cookies for one configuration.
#[derive(Debug, Clone, Copy)]
pub struct SessionCookies<'a> {
    config: &'a SessionConfig,
}

impl<'a> SessionCookies<'a> {
    /// Creates a codec for the given configuration.
    #[must_use]
    pub fn new(config: &'a SessionConfig) -> Self {
        Self { config }
    }

    fn chunk_name(&self, index: usize) -> String {
        format!("{}.{index}", self.config.cookie_name)
    }

    /// Returns true if `name` is the session cookie or one of its chunks.
    #[must_use]
    pub fn is_session_cookie(&self, name: &str) -> bool {
        let base = self.config.cookie_name.as_str();
        match name.strip_prefix(base) {
            Some("") => true,
            Some(rest) => rest
                .strip_prefix('.')
                .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit())),
            None => false,
        }
    }

    /// Reassembles the raw cookie value, if any.
    fn raw_value(&self, jar: &CookieJar) -> Option<String> {
        if let Some(cookie) = jar.get(&self.config.cookie_name) {
            return Some(cookie.value().to_string());
        }
        let mut value = String::new();
        let mut index = 0;
        while let Some(chunk) = jar.get(&self.chunk_name(index)) {
            value.push_str(chunk.value());
            index += 1;
        }
        (index > 0).then_some(value)
    }

    /// Reads the session from the request cookies.
    ///
    /// Returns `Ok(None)` when no session cookie is present.
    pub fn read(&self, jar: &CookieJar) -> Result<Option<Session>, CookieError> {
        let Some(raw) = self.raw_value(jar) else {
            return Ok(None);
        };
        decode(&raw).map(Some)
    }

    fn build(&self, name: String, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .secure(self.config.secure_cookies)
            .same_site(SameSite::Lax)
            .max_age(TimeDuration::days(self.config.cookie_max_age_days))
            .build()
    }

    fn removal(name: String) -> Cookie<'static> {
        Cookie::build((name, ""))
            .path("/")
            .max_age(TimeDuration::ZERO)
            .build()
    }

    /// Cookies that store `session`, removing stale chunks found in `jar`.
    pub fn write(&self, jar: &CookieJar, session: &Session) -> Result<Vec<Cookie<'static>>, CookieError> {
        let value = encode(session)?;
        let mut cookies = Vec::new();

        if value.len() <= MAX_CHUNK_SIZE {
            cookies.push(self.build(self.config.cookie_name.clone(), value));
            cookies.extend(
                jar.iter()
                    .filter(|c| c.name() != self.config.cookie_name && self.is_session_cookie(c.name()))
                    .map(|c| Self::removal(c.name().to_string())),
            );
            return Ok(cookies);
        }

        let chunks = split_chunks(&value, MAX_CHUNK_SIZE);
        let written: Vec<String> = (0..chunks.len()).map(|i| self.chunk_name(i)).collect();
        for (name, chunk) in written.iter().zip(chunks) {
            cookies.push(self.build(name.clone(), chunk.to_string()));
        }
        cookies.extend(
            jar.iter()
                .filter(|c| self.is_session_cookie(c.name()) && !written.iter().any(|w| w == c.name()))
                .map(|c| Self::removal(c.name().to_string())),
        );
        Ok(cookies)
    }

    /// Cookies that remove every session cookie.
    ///
    /// The base cookie is always removed, even if the request did not carry it.
    #[must_use]
    pub fn clear(&self, jar: &CookieJar) -> Vec<Cookie<'static>> {
        let mut cookies = vec![Self::removal(self.config.cookie_name.clone())];
        cookies.extend(
            jar.iter()
                .filter(|c| c.name() != self.config.cookie_name && self.is_session_cookie(c.name()))
                .map(|c| Self::removal(c.name().to_string())),
        );
        cookies
    }

    /// Reads the PKCE code verifier, if present.
    #[must_use]
    pub fn code_verifier(&self, jar: &CookieJar) -> Option<String> {
        let raw = jar.get(&self.config.code_verifier_cookie())?.value().to_string();
        let decoded = match raw.strip_prefix(BASE64_PREFIX) {
            Some(encoded) => String::from_utf8(URL_SAFE_NO_PAD.decode(encoded).ok()?).ok()?,
            None => raw,
        };
        // Stored as a JSON string by browser clients.
        let verifier = serde_json::from_str::<String>(&decoded).unwrap_or(decoded);
        (!verifier.is_empty()).then_some(verifier)
    }

    /// Cookie that removes the PKCE code verifier.
    #[must_use]
    pub fn clear_code_verifier(&self) -> Cookie<'static> {
        Self::removal(self.config.code_verifier_cookie())
    }
}

/// Encodes a session as a cookie value.
pub fn encode(session: &Session) -> Result<String, CookieError> {
    let json = serde_json::to_vec(session).map_err(|e| CookieError::Format {
        details: e.to_string(),
    })?;
    Ok(format!("{BASE64_PREFIX}{}", URL_SAFE_NO_PAD.encode(json)))
}

/// Decodes a cookie value into a session.
///
/// Values without the `base64-` prefix are read as plain JSON.
pub fn decode(raw: &str) -> Result<Session, CookieError> {
    let json = match raw.strip_prefix(BASE64_PREFIX) {
        Some(encoded) => URL_SAFE_NO_PAD
            .decode(encoded.trim_end_matches('='))
            .map_err(|e| CookieError::Encoding {
                details: e.to_string(),
            })?,
        None => raw.as_bytes().to_vec(),
    };
    serde_json::from_slice(&json).map_err(|e| CookieError::Format {
        details: e.to_string(),
    })
}

/// Splits an ASCII value into pieces of at most `size` bytes.
fn split_chunks(value: &str, size: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = value;
    while !rest.is_empty() {
        let (head, tail) = rest.split_at(size.min(rest.len()));
        chunks.push(head);
        rest = tail;
    }
    chunks
}
