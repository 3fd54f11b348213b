//! Redis-backed store.

use super::{post, user, AccountStore, PostStore, StoreError, UpdateOutcome};
use crate::models::{StoredPost, StoredUser};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

/// [`AccountStore`] + [`PostStore`] over a Redis server.
///
/// Each operation takes a multiplexed connection from the client.
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    pub fn open(url: &str) -> Result<Self, StoreError> {
        Ok(Self::new(redis::Client::open(url)?))
    }

    async fn connection(&self) -> Result<MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Backend(format!("Redis connection error: {}", e)))
    }

    /// Round-trip a PING so startup fails fast on an unreachable server.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut con = self.connection().await?;
        let _pong: String = redis::cmd("PING").query_async(&mut con).await?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for RedisStore {
    async fn create_user(&self, new_user: &StoredUser) -> Result<(), StoreError> {
        let mut con = self.connection().await?;
        user::create_user(&mut con, new_user).await
    }

    async fn get_user(&self, id: &str) -> Result<Option<StoredUser>, StoreError> {
        let mut con = self.connection().await?;
        user::get_user(&mut con, id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<StoredUser>, StoreError> {
        let mut con = self.connection().await?;
        user::get_user_by_email(&mut con, email).await
    }
}

#[async_trait]
impl PostStore for RedisStore {
    async fn create_post(&self, new_post: &StoredPost) -> Result<(), StoreError> {
        let mut con = self.connection().await?;
        post::store_post(&mut con, new_post).await
    }

    async fn get_post(&self, id: &str) -> Result<Option<StoredPost>, StoreError> {
        let mut con = self.connection().await?;
        post::get_post(&mut con, id).await
    }

    async fn list_posts(&self) -> Result<Vec<StoredPost>, StoreError> {
        let mut con = self.connection().await?;
        post::list_posts(&mut con).await
    }

    async fn list_user_posts(&self, owner_id: &str) -> Result<Vec<StoredPost>, StoreError> {
        let mut con = self.connection().await?;
        post::list_user_posts(&mut con, owner_id).await
    }

    async fn update_post(
        &self,
        expected: &StoredPost,
        updated: &StoredPost,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut con = self.connection().await?;
        post::update_post(&mut con, expected, updated).await
    }

    async fn delete_post(&self, id: &str) -> Result<Option<StoredPost>, StoreError> {
        let mut con = self.connection().await?;
        post::delete_post(&mut con, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Connect to a local Redis, or None to skip the test.
    async fn test_store() -> Option<RedisStore> {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let store = match RedisStore::open(&redis_url) {
            Ok(s) => s,
            Err(_) => {
                eprintln!("Skipping test: Redis not available");
                return None;
            }
        };
        if store.ping().await.is_err() {
            eprintln!("Skipping test: Redis connection failed");
            return None;
        }
        Some(store)
    }

    fn test_user() -> StoredUser {
        let id = nanoid::nanoid!(12);
        StoredUser {
            email: format!("redis-test-{}@example.com", id.to_lowercase()),
            id,
            password_hash: "$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$aGFzaA".to_string(),
            created_at: 1,
        }
    }

    #[tokio::test]
    async fn test_user_round_trip_and_conflict() {
        let Some(store) = test_store().await else {
            return;
        };
        let user = test_user();

        store.create_user(&user).await.unwrap();

        let by_id = store.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, user.email);
        let by_email = store.get_user_by_email(&user.email).await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        let mut dup = test_user();
        dup.email = user.email.clone();
        let result = store.create_user(&dup).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert!(store.get_user(&dup.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_post_lifecycle() {
        let Some(store) = test_store().await else {
            return;
        };
        let owner = nanoid::nanoid!(12);
        let mut p = StoredPost {
            id: nanoid::nanoid!(12),
            title: "t".to_string(),
            body: "b".to_string(),
            owner_id: owner.clone(),
            created_at: 1,
            updated_at: 1,
        };

        store.create_post(&p).await.unwrap();
        assert_eq!(store.get_post(&p.id).await.unwrap().unwrap(), p);

        let mine = store.list_user_posts(&owner).await.unwrap();
        assert_eq!(mine, vec![p.clone()]);

        let original = p.clone();
        p.title = "t2".to_string();
        assert_eq!(
            store.update_post(&original, &p).await.unwrap(),
            UpdateOutcome::Updated
        );
        assert_eq!(store.get_post(&p.id).await.unwrap().unwrap().title, "t2");

        // A writer holding the old version loses.
        let mut late = original.clone();
        late.body = "late".to_string();
        assert_eq!(
            store.update_post(&original, &late).await.unwrap(),
            UpdateOutcome::Stale
        );
        assert_eq!(store.get_post(&p.id).await.unwrap().unwrap(), p);

        let deleted = store.delete_post(&p.id).await.unwrap().unwrap();
        assert_eq!(deleted.id, p.id);
        assert!(store.get_post(&p.id).await.unwrap().is_none());
        assert!(store.list_user_posts(&owner).await.unwrap().is_empty());

        // Gone posts are neither updated nor resurrected.
        assert_eq!(
            store.update_post(&p, &p).await.unwrap(),
            UpdateOutcome::Missing
        );
        assert!(store.get_post(&p.id).await.unwrap().is_none());
        assert!(store.delete_post(&p.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_listing_returns_each_post_once() {
        let Some(store) = test_store().await else {
            return;
        };
        let owner = nanoid::nanoid!(12);
        let mut ids = Vec::new();
        for created_at in [3, 1, 2] {
            let p = StoredPost {
                id: nanoid::nanoid!(12),
                title: "t".to_string(),
                body: "b".to_string(),
                owner_id: owner.clone(),
                created_at,
                updated_at: created_at,
            };
            store.create_post(&p).await.unwrap();
            ids.push(p.id);
        }

        let ours = |posts: Vec<StoredPost>| -> Vec<String> {
            posts
                .into_iter()
                .filter(|p| p.owner_id == owner)
                .map(|p| p.id)
                .collect()
        };

        // Oldest first, no duplicates.
        let listed = ours(store.list_posts().await.unwrap());
        assert_eq!(listed, vec![ids[1].clone(), ids[2].clone(), ids[0].clone()]);

        // Storing the same post again does not duplicate it in the index.
        let again = store.get_post(&ids[0]).await.unwrap().unwrap();
        store.create_post(&again).await.unwrap();
        assert_eq!(ours(store.list_posts().await.unwrap()).len(), 3);

        for id in &ids {
            store.delete_post(id).await.unwrap();
        }
        assert!(ours(store.list_posts().await.unwrap()).is_empty());
        assert!(store.list_user_posts(&owner).await.unwrap().is_empty());
    }
}
