//! API route handlers.

pub mod auth;
pub mod posts;

use crate::auth::middleware::{require_auth, AppState};
use crate::error::AppError;
use crate::middleware::security_headers;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;

/// Length of generated user and post ids.
pub const ID_LEN: usize = 12;

const MAX_EMAIL_LEN: usize = 254;
const MAX_LOCAL_PART_LEN: usize = 64;
const MAX_PASSWORD_LEN: usize = 1024;

/// Validate that a string is a valid nanoid (alphanumeric, hyphens, underscores).
pub fn validate_id(id: &str, label: &str, expected_len: usize) -> Result<(), AppError> {
    if id.len() != expected_len
        || !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::BadRequest(format!("Invalid {} format", label)));
    }
    Ok(())
}

/// Canonical form used for storage and lookup.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Syntactic check of a normalized address: `local@domain.tld`, ASCII only.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let invalid = || AppError::BadRequest("Invalid email address".to_string());

    if email.is_empty() || email.len() > MAX_EMAIL_LEN {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;

    let local_ok = !local.is_empty()
        && local.len() <= MAX_LOCAL_PART_LEN
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    if !local_ok {
        return Err(invalid());
    }

    // Requires at least one dot; every label non-empty and not hyphen-edged.
    let labels: Vec<&str> = domain.split('.').collect();
    let domain_ok = labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
    if !domain_ok {
        return Err(invalid());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.is_empty() {
        return Err(AppError::BadRequest("Password is required".to_string()));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at most {} bytes",
            MAX_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Build the API router with all endpoints.
///
/// Protected handlers sit behind [`require_auth`]; public methods sharing a
/// path with protected ones are merged in without the gate.
pub fn api_router(state: AppState) -> Router<AppState> {
    let gate = middleware::from_fn_with_state(state, require_auth);

    Router::new()
        // Auth endpoints
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", get(auth::logout))
        .route(
            "/api/auth/validate",
            get(auth::validate).route_layer(gate.clone()),
        )
        // Post endpoints
        .route(
            "/api/posts",
            get(posts::list_posts).merge(post(posts::create_post).route_layer(gate.clone())),
        )
        .route(
            "/api/posts/mine",
            get(posts::list_my_posts).route_layer(gate.clone()),
        )
        .route(
            "/api/posts/{id}",
            get(posts::get_post).merge(
                put(posts::update_post)
                    .delete(posts::delete_post)
                    .route_layer(gate),
            ),
        )
}

/// The complete application: API routes plus body limit, CORS and
/// security headers.
pub fn app(state: AppState) -> Router {
    // CorsLayer::new() with no allowed origins rejects all cross-origin requests.
    let cors = CorsLayer::new();
    let max_body_bytes = state.config.max_body_bytes;

    api_router(state.clone())
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("abcDEF123_-x", "post ID", ID_LEN).is_ok());
        assert!(validate_id("short", "post ID", ID_LEN).is_err());
        assert!(validate_id("abcdefghijk!", "post ID", ID_LEN).is_err());
        assert!(validate_id("../../etc/pa", "post ID", ID_LEN).is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM \n"), "alice@example.com");
    }

    #[test]
    fn test_valid_emails() {
        for email in [
            "a@x.com",
            "first.last@example.co.uk",
            "user+tag@sub.example.org",
            "x_y-z%1@a-b.io",
        ] {
            assert!(validate_email(email).is_ok(), "{} should be valid", email);
        }
    }

    #[test]
    fn test_invalid_emails() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        let long_local = format!("{}@example.com", "a".repeat(65));
        for email in [
            "",
            "plainaddress",
            "@example.com",
            "user@",
            "user@localhost",
            "a@@x.com",
            "a@b@x.com",
            "a b@x.com",
            ".a@x.com",
            "a.@x.com",
            "a..b@x.com",
            "a@x..com",
            "a@.x.com",
            "a@x.com.",
            "a@-x.com",
            "a@x-.com",
            "<a>@x.com",
            too_long.as_str(),
            long_local.as_str(),
        ] {
            assert!(validate_email(email).is_err(), "{:?} should be invalid", email);
        }
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("pw").is_ok());
        assert!(validate_password(&"p".repeat(MAX_PASSWORD_LEN)).is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password(&"p".repeat(MAX_PASSWORD_LEN + 1)).is_err());
    }
}
