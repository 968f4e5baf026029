//! Session cookie handling.
//!
//! The cookie carries only the random [`SessionId`]; everything else stays in
//! the server-side session store.

use bucketdesk_core::SessionId;
use http::HeaderMap;
use http::header::{COOKIE, HeaderValue};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "bucketdesk_session";

/// Read the session id from the request's `Cookie` headers.
///
/// Malformed ids are ignored, as if no cookie had been sent.
#[must_use]
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| value.trim_matches('"').parse().ok())
}

/// Build the `Set-Cookie` value binding the browser to `id`.
#[must_use]
pub fn session_cookie(id: SessionId, max_age_secs: u64, secure: bool) -> HeaderValue {
    let mut cookie =
        format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static("invalid=1"))
}
