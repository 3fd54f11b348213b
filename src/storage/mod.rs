//! Account and post storage.
//!
//! Handlers only see the [`AccountStore`] and [`PostStore`] traits. The Redis
//! backend ([`RedisStore`]) serves production; [`MemoryStore`] serves tests.
//! Records are serialized to JSON.

pub mod memory;
pub mod post;
pub mod redis_store;
pub mod user;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

use crate::models::{StoredPost, StoredUser};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Backend(format!("Redis error: {}", err))
    }
}

/// Result of a compare-and-set post update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// The record changed since it was read.
    Stale,
    /// The record is gone.
    Missing,
}

/// Persistence for principals.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persist a new principal.
    ///
    /// Fails with [`StoreError::Conflict`] if the email is already registered.
    async fn create_user(&self, user: &StoredUser) -> Result<(), StoreError>;

    async fn get_user(&self, id: &str) -> Result<Option<StoredUser>, StoreError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<StoredUser>, StoreError>;
}

/// Persistence for owned posts.
///
/// Listings are ordered by `created_at`, then `id`.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create_post(&self, post: &StoredPost) -> Result<(), StoreError>;

    async fn get_post(&self, id: &str) -> Result<Option<StoredPost>, StoreError>;

    async fn list_posts(&self) -> Result<Vec<StoredPost>, StoreError>;

    async fn list_user_posts(&self, owner_id: &str) -> Result<Vec<StoredPost>, StoreError>;

    /// Replace `expected` with `post`, only if the stored record still equals
    /// `expected`.
    async fn update_post(
        &self,
        expected: &StoredPost,
        post: &StoredPost,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Delete a post, returning it if it existed.
    async fn delete_post(&self, id: &str) -> Result<Option<StoredPost>, StoreError>;
}

/// Everything the HTTP layer needs from storage.
pub trait Store: AccountStore + PostStore {}

impl<T: AccountStore + PostStore> Store for T {}

/// Sort posts into listing order.
pub(crate) fn sort_posts(posts: &mut [StoredPost]) {
    posts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}
