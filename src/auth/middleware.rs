//! The auth gate: token verification and principal binding for protected routes.

use crate::auth::password::{CredentialHasher, HashError};
use crate::auth::session::extract_token;
use crate::auth::token::{TokenCodec, TokenError};
use crate::config::Config;
use crate::error::AppError;
use crate::models::UserResponse;
use crate::storage::Store;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Application state shared across handlers.
///
/// Built once at startup; nothing in it is mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenCodec,
    pub hasher: CredentialHasher,
    pub config: Arc<Config>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Token codec: {0}")]
    Token(#[from] TokenError),

    #[error("Password hasher: {0}")]
    Hash(#[from] HashError),
}

impl AppState {
    /// Build the signing codec and hasher from `config`.
    pub fn new(config: Config, store: Arc<dyn Store>) -> Result<Self, InitError> {
        let tokens = TokenCodec::from_config(&config)?;
        let hasher = CredentialHasher::from_config(&config)?;
        Ok(Self {
            store,
            tokens,
            hasher,
            config: Arc::new(config),
        })
    }
}

/// The authenticated principal, as bound by [`require_auth`].
///
/// Extracting it on a route without the gate yields 401, never a panic.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserResponse);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(AppError::unauthenticated)
    }
}

/// Resolve the caller of a request to a principal.
///
/// Token missing, token invalid for any reason, or subject no longer
/// existing all produce the same 401. Store failures are 500s.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, AppError> {
    let token = extract_token(headers).ok_or_else(|| {
        tracing::debug!(reason = "missing_token", "Rejected unauthenticated request");
        AppError::unauthenticated()
    })?;

    let claims = state.tokens.verify(&token).map_err(|e| {
        tracing::debug!(reason = %e, "Rejected session token");
        AppError::from(e)
    })?;

    // Re-read the principal on every request so removed accounts lose access
    // immediately despite the stateless token.
    let user = state.store.get_user(&claims.sub).await?.ok_or_else(|| {
        tracing::warn!(action = "auth_failed", reason = "unknown_subject", user_id = %claims.sub, "Token subject does not resolve");
        AppError::unauthenticated()
    })?;

    Ok(AuthUser(UserResponse::from(&user)))
}

/// Middleware for protected routes.
///
/// Runs [`authenticate`] and binds the resulting [`AuthUser`] into the
/// request extensions before the handler runs.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&state, request.headers()).await?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
