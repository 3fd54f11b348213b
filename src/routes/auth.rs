//! Auth API endpoints.

use super::{normalize_email, validate_email, validate_password, ID_LEN};
use crate::auth::middleware::{AppState, AuthUser};
use crate::auth::session::{clear_session_cookie, session_cookie};
use crate::error::AppError;
use crate::models::{
    unix_now, CredentialsRequest, MessageResponse, StoredUser, UserEnvelope, UserResponse,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::IntoResponse,
    Json,
};
use zeroize::Zeroizing;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// POST /api/auth/register: Create an account
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body?;
    let email = normalize_email(&req.email);
    validate_email(&email)?;
    validate_password(&req.password)?;

    let password_hash = state
        .hasher
        .hash_password(Zeroizing::new(req.password))
        .await?;

    let user = StoredUser {
        id: nanoid::nanoid!(ID_LEN),
        email,
        password_hash,
        created_at: unix_now(),
    };

    // Uniqueness is enforced by the store; a taken email surfaces as 409.
    state.store.create_user(&user).await?;

    tracing::info!(action = "user_registered", user_id = %user.id, "New user registered");

    Ok(Json(UserEnvelope {
        user: UserResponse::from(&user),
    }))
}

/// POST /api/auth/login: Verify credentials and issue a session cookie
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body?;
    let email = normalize_email(&req.email);
    let password = Zeroizing::new(req.password);

    let Some(user) = state.store.get_user_by_email(&email).await? else {
        // Burn the same hashing cost as a real check before failing.
        state.hasher.verify_dummy(password).await;
        tracing::warn!(action = "auth_failed", reason = "unknown_email", "Login rejected");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let valid = state
        .hasher
        .verify_password(user.password_hash.clone(), password)
        .await?;
    if !valid {
        tracing::warn!(action = "auth_failed", reason = "bad_password", user_id = %user.id, "Login rejected");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = state.tokens.issue(&user.id)?;
    let cookie = session_cookie(&token, state.tokens.ttl_secs(), state.config.cookie_secure)
        .ok_or_else(|| AppError::Internal("Session cookie is not a valid header".to_string()))?;

    tracing::info!(action = "auth_success", user_id = %user.id, "User authenticated");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(UserEnvelope {
            user: UserResponse::from(&user),
        }),
    ))
}

/// GET /api/auth/logout: Clear the session cookie
///
/// Tokens are stateless, so this only tells the client to drop its copy.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(
            header::SET_COOKIE,
            clear_session_cookie(state.config.cookie_secure),
        )],
        Json(MessageResponse { message: "success" }),
    )
}

/// GET /api/auth/validate: Current principal
pub async fn validate(AuthUser(user): AuthUser) -> Json<UserEnvelope> {
    Json(UserEnvelope { user })
}

#[cfg(test)]
mod tests {
    use crate::routes::app;
    use crate::test_support::{send, test_state, TestResponse};
    use axum::http::{header, StatusCode};
    use serde_json::json;

    async fn register(state: &crate::auth::AppState, email: &str, password: &str) -> TestResponse {
        send(
            app(state.clone()),
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    async fn login(state: &crate::auth::AppState, email: &str, password: &str) -> TestResponse {
        send(
            app(state.clone()),
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    fn cookie_token(response: &TestResponse) -> String {
        let cookie = response
            .headers
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        cookie
            .split(';')
            .next()
            .unwrap()
            .strip_prefix("token=")
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_register_returns_principal_without_hash() {
        let state = test_state();
        let response = register(&state, "  A@X.com ", "pw").await;

        assert_eq!(response.status, StatusCode::OK);
        let user = &response.body["user"];
        assert_eq!(user["email"], "a@x.com");
        assert_eq!(user["id"].as_str().unwrap().len(), 12);
        assert!(user.get("password").is_none());
        assert!(user.get("password_hash").is_none());
        assert!(!response.body.to_string().contains("argon2"));
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let state = test_state();

        let response = register(&state, "not-an-email", "pw").await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"], "Invalid email address");

        let response = register(&state, "a@x.com", "").await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflict() {
        let state = test_state();
        assert_eq!(register(&state, "a@x.com", "pw").await.status, StatusCode::OK);

        let response = register(&state, "A@x.com", "other").await;
        assert_eq!(response.status, StatusCode::CONFLICT);
        assert_eq!(response.body["error"], "Email already registered");
    }

    #[tokio::test]
    async fn test_login_sets_cookie() {
        let state = test_state();
        let registered = register(&state, "a@x.com", "pw").await;

        let response = login(&state, "a@x.com", "pw").await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["user"], registered.body["user"]);

        let cookie = response
            .headers
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.starts_with("token="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains(&format!("Max-Age={}", state.tokens.ttl_secs())));
        assert!(!cookie.contains("Secure"));

        let claims = state.tokens.verify(&cookie_token(&response)).unwrap();
        assert_eq!(claims.sub, registered.body["user"]["id"].as_str().unwrap());
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let state = test_state();
        register(&state, "a@x.com", "pw").await;

        let wrong_password = login(&state, "a@x.com", "wrong").await;
        let unknown_email = login(&state, "b@x.com", "pw").await;

        for response in [&wrong_password, &unknown_email] {
            assert_eq!(response.status, StatusCode::UNAUTHORIZED);
            assert_eq!(response.body["error"], "Invalid email or password");
            assert!(response.headers.get(header::SET_COOKIE).is_none());
        }
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let state = test_state();
        let response = send(app(state), "GET", "/api/auth/logout", None, None).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!({ "message": "success" }));
        let cookie = response
            .headers
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.starts_with("token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_validate_returns_current_principal() {
        let state = test_state();
        let registered = register(&state, "a@x.com", "pw").await;
        let token = cookie_token(&login(&state, "a@x.com", "pw").await);

        let response = send(app(state.clone()), "GET", "/api/auth/validate", Some(&token), None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["user"], registered.body["user"]);

        let response = send(app(state), "GET", "/api/auth/validate", None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_incomplete_credentials_are_json_errors() {
        let state = test_state();

        for uri in ["/api/auth/login", "/api/auth/register"] {
            let response = send(
                app(state.clone()),
                "POST",
                uri,
                None,
                Some(json!({ "email": "a" })),
            )
            .await;
            assert_eq!(response.status, StatusCode::BAD_REQUEST);
            assert!(response.body["error"]
                .as_str()
                .unwrap()
                .starts_with("Invalid request body"));
        }
    }
}
