//! In-memory store for tests and local development.
//!
//! Same contract as the Redis store, held in `HashMap`s behind one
//! `tokio::sync::RwLock`. Nothing survives a restart.

use super::{sort_posts, AccountStore, PostStore, StoreError, UpdateOutcome};
use crate::models::{StoredPost, StoredUser};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    users: HashMap<String, StoredUser>,
    /// email -> user id
    emails: HashMap<String, String>,
    posts: HashMap<String, StoredPost>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_user(&self, user: &StoredUser) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.emails.contains_key(&user.email) {
            return Err(StoreError::Conflict("Email already registered".to_string()));
        }
        inner.emails.insert(user.email.clone(), user.id.clone());
        inner.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Option<StoredUser>, StoreError> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<StoredUser>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .emails
            .get(email)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create_post(&self, post: &StoredPost) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .posts
            .insert(post.id.clone(), post.clone());
        Ok(())
    }

    async fn get_post(&self, id: &str) -> Result<Option<StoredPost>, StoreError> {
        Ok(self.inner.read().await.posts.get(id).cloned())
    }

    async fn list_posts(&self) -> Result<Vec<StoredPost>, StoreError> {
        let mut posts: Vec<StoredPost> = self.inner.read().await.posts.values().cloned().collect();
        sort_posts(&mut posts);
        Ok(posts)
    }

    async fn list_user_posts(&self, owner_id: &str) -> Result<Vec<StoredPost>, StoreError> {
        let mut posts: Vec<StoredPost> = self
            .inner
            .read()
            .await
            .posts
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        sort_posts(&mut posts);
        Ok(posts)
    }

    async fn update_post(
        &self,
        expected: &StoredPost,
        post: &StoredPost,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.posts.get_mut(&post.id) {
            Some(existing) if existing == expected => {
                *existing = post.clone();
                Ok(UpdateOutcome::Updated)
            }
            Some(_) => Ok(UpdateOutcome::Stale),
            None => Ok(UpdateOutcome::Missing),
        }
    }

    async fn delete_post(&self, id: &str) -> Result<Option<StoredPost>, StoreError> {
        Ok(self.inner.write().await.posts.remove(id))
    }
}
