//! Post API endpoints.
//!
//! Reads are public. Creating needs a principal; updating and deleting
//! additionally need that principal to own the post.

use super::{validate_id, ID_LEN};
use crate::auth::middleware::{AppState, AuthUser};
use crate::auth::policy::{authorize_mutation, Decision};
use crate::error::AppError;
use crate::models::{
    unix_now, CreatePostRequest, PostEnvelope, PostListResponse, StoredPost, UpdatePostRequest,
};
use crate::storage::UpdateOutcome;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

/// Attempts at a compare-and-set update before giving up with 409.
const MAX_UPDATE_ATTEMPTS: usize = 3;

fn not_found() -> AppError {
    AppError::NotFound("Post not found".to_string())
}

/// Load a post and check the principal may mutate it.
async fn load_owned(state: &AppState, id: &str, user: &AuthUser) -> Result<StoredPost, AppError> {
    validate_id(id, "post ID", ID_LEN)?;

    let post = state.store.get_post(id).await?.ok_or_else(not_found)?;

    match authorize_mutation(&post.owner_id, &user.0.id) {
        Decision::Allow => Ok(post),
        Decision::Deny => {
            tracing::warn!(action = "mutation_denied", post_id = %id, user_id = %user.0.id, "Non-owner mutation attempt");
            Err(AppError::Forbidden("Not the owner of this post".to_string()))
        }
    }
}

/// POST /api/posts: Create post owned by the caller
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<Json<PostEnvelope>, AppError> {
    let Json(req) = body?;
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }

    let now = unix_now();
    let post = StoredPost {
        id: nanoid::nanoid!(ID_LEN),
        title: req.title,
        body: req.body,
        owner_id: user.id,
        created_at: now,
        updated_at: now,
    };

    state.store.create_post(&post).await?;

    tracing::info!(action = "post_created", post_id = %post.id, user_id = %post.owner_id, "Post created");

    Ok(Json(PostEnvelope { post }))
}

/// GET /api/posts: All posts
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<PostListResponse>, AppError> {
    let posts = state.store.list_posts().await?;
    Ok(Json(PostListResponse { posts }))
}

/// GET /api/posts/mine: Posts owned by the caller
pub async fn list_my_posts(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<PostListResponse>, AppError> {
    let posts = state.store.list_user_posts(&user.id).await?;
    Ok(Json(PostListResponse { posts }))
}

/// GET /api/posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostEnvelope>, AppError> {
    validate_id(&id, "post ID", ID_LEN)?;

    let post = state.store.get_post(&id).await?.ok_or_else(not_found)?;
    Ok(Json(PostEnvelope { post }))
}

/// PUT /api/posts/{id}: Owner-only partial update
///
/// Ownership is checked before the body is looked at. The write is a
/// compare-and-set against the version read, re-read and re-applied when a
/// concurrent edit got there first.
pub async fn update_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> Result<Json<PostEnvelope>, AppError> {
    let mut current = load_owned(&state, &id, &user).await?;
    let Json(req) = body?;

    for _ in 0..MAX_UPDATE_ATTEMPTS {
        let mut post = current.clone();
        if !post.apply(req.clone(), unix_now()) {
            return Ok(Json(PostEnvelope { post }));
        }

        match state.store.update_post(&current, &post).await? {
            UpdateOutcome::Updated => {
                tracing::info!(action = "post_updated", post_id = %post.id, user_id = %user.0.id, "Post updated");
                return Ok(Json(PostEnvelope { post }));
            }
            UpdateOutcome::Missing => return Err(not_found()),
            UpdateOutcome::Stale => {
                tracing::debug!(post_id = %id, "Concurrent post edit, retrying");
                current = load_owned(&state, &id, &user).await?;
            }
        }
    }

    Err(AppError::Conflict(
        "Post was modified concurrently, try again".to_string(),
    ))
}

/// DELETE /api/posts/{id}: Owner-only delete, returns the removed post
pub async fn delete_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PostEnvelope>, AppError> {
    load_owned(&state, &id, &user).await?;

    let post = state.store.delete_post(&id).await?.ok_or_else(not_found)?;

    tracing::info!(action = "post_deleted", post_id = %post.id, user_id = %user.0.id, "Post deleted");

    Ok(Json(PostEnvelope { post }))
}
