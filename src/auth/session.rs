//! Session token transport: the `token` cookie and the Bearer fallback.

use axum::http::{header, HeaderMap, HeaderValue};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

/// Pull the session token out of a request.
///
/// Looks at the `token` cookie first, then `Authorization: Bearer {token}`.
/// Empty values count as absent.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let prefix = format!("{}=", SESSION_COOKIE);
    for value in headers.get_all(header::COOKIE) {
        let Ok(cookies) = value.to_str() else {
            continue;
        };
        for cookie in cookies.split(';') {
            if let Some(token) = cookie.trim().strip_prefix(&prefix) {
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// `Set-Cookie` value that hands the client a session token.
///
/// `Secure` is only added when configured; plain-HTTP deployments leave it off.
pub fn session_cookie(token: &str, max_age_secs: u64, secure: bool) -> Option<HeaderValue> {
    build_cookie(token, max_age_secs, secure)
}

/// `Set-Cookie` value that makes the client discard its session token.
pub fn clear_session_cookie(secure: bool) -> HeaderValue {
    // An empty value with fixed attributes is always a valid header value.
    build_cookie("", 0, secure).unwrap_or_else(|| HeaderValue::from_static("token=; Max-Age=0"))
}

fn build_cookie(value: &str, max_age_secs: u64, secure: bool) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, value, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}
