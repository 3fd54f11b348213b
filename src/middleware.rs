//! Security headers middleware.
//!
//! Every response is JSON, so the policy is as tight as it gets: nothing
//! may be loaded, framed, cached or sniffed.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

/// Adds security headers to all responses, errors included.
///
/// - `cache-control: no-store` keeps principals and posts out of shared caches.
/// - `referrer-policy: no-referrer`
/// - `x-content-type-options: nosniff`
/// - `x-frame-options: DENY` plus `frame-ancestors 'none'` against framing.
/// - `content-security-policy: default-src 'none'` since the API serves no
///   documents of its own.
///
/// ```rust,no_run
/// use axum::Router;
/// use axum::middleware;
/// use postgate::middleware::security_headers;
///
/// let app: Router = Router::new()
///     .layer(middleware::from_fn(security_headers));
/// ```
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("cache-control", HeaderValue::from_static("no-store"));
    headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );

    response
}
