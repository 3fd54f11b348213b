//! Request and response models for the API.
//!
//! Storage models (`Stored*`) are what the store persists. Response models
//! are what clients see; the password hash never crosses that boundary.

use serde::{Deserialize, Serialize};

// ============================================================================
// Auth Models
// ============================================================================

/// Body of register and login requests.
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Public view of a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub created_at: u64,
}

impl From<&StoredUser> for UserResponse {
    fn from(user: &StoredUser) -> Self {
        UserResponse {
            id: user.id.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

/// `{"user": ...}` envelope.
#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

/// `{"message": ...}` envelope.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ============================================================================
// Post Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Partial update; absent or empty fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub body: Option<String>,
}

/// `{"post": ...}` envelope.
#[derive(Debug, Serialize)]
pub struct PostEnvelope {
    pub post: StoredPost,
}

/// `{"posts": [...]}` envelope.
#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<StoredPost>,
}

// ============================================================================
// Storage Models
// ============================================================================

/// Principal as stored. `password_hash` is a PHC-format Argon2id string.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: u64,
}

impl std::fmt::Debug for StoredUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Post as stored. `owner_id` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPost {
    pub id: String,
    pub title: String,
    pub body: String,
    pub owner_id: String,
    pub created_at: u64,
    pub updated_at: u64,
}

impl StoredPost {
    /// Apply a partial update in place. Returns true if anything changed.
    pub fn apply(&mut self, update: UpdatePostRequest, now: u64) -> bool {
        let mut changed = false;
        if let Some(title) = update.title.filter(|t| !t.is_empty()) {
            self.title = title;
            changed = true;
        }
        if let Some(body) = update.body.filter(|b| !b.is_empty()) {
            self.body = body;
            changed = true;
        }
        if changed {
            self.updated_at = now;
        }
        changed
    }
}

/// Current Unix time in seconds.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
