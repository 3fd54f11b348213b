//! Post Redis operations.
//!
//! Redis key patterns:
//! - `post:{nanoid}`: post data (JSON)
//! - `posts`: ZSET of every post ID, scored by `created_at`
//! - `user_posts:{user_id}`: SET of post IDs owned by user

use super::{sort_posts, StoreError, UpdateOutcome};
use crate::models::StoredPost;
use redis::AsyncCommands;

const POST_PREFIX: &str = "post:";
const POSTS_INDEX: &str = "posts";
const USER_POSTS_PREFIX: &str = "user_posts:";

fn post_key(id: &str) -> String {
    format!("{}{}", POST_PREFIX, id)
}

/// Store a post and add it to the global and owner indexes.
pub async fn store_post<C>(con: &mut C, post: &StoredPost) -> Result<(), StoreError>
where
    C: AsyncCommands,
{
    let json = serde_json::to_string(post)?;
    let user_posts_key = format!("{}{}", USER_POSTS_PREFIX, post.owner_id);

    let _: () = redis::pipe()
        .atomic()
        .set(post_key(&post.id), json)
        .ignore()
        .zadd(POSTS_INDEX, &post.id, post.created_at)
        .ignore()
        .sadd(&user_posts_key, &post.id)
        .ignore()
        .query_async(con)
        .await?;

    Ok(())
}

/// Get a post by ID.
pub async fn get_post<C>(con: &mut C, id: &str) -> Result<Option<StoredPost>, StoreError>
where
    C: AsyncCommands,
{
    let json: Option<String> = con.get(post_key(id)).await?;

    match json {
        Some(data) => Ok(Some(serde_json::from_str(&data)?)),
        None => Ok(None),
    }
}

/// Compare-and-set: overwrite a post only if the stored JSON still equals
/// the serialized `expected` record.
///
/// Runs as one script so neither a concurrent edit nor a concurrent delete
/// is overwritten.
pub async fn update_post<C>(
    con: &mut C,
    expected: &StoredPost,
    post: &StoredPost,
) -> Result<UpdateOutcome, StoreError>
where
    C: AsyncCommands,
{
    let expected_json = serde_json::to_string(expected)?;
    let json = serde_json::to_string(post)?;

    let script = redis::Script::new(
        r"
        local current = redis.call('GET', KEYS[1])
        if not current then
            return 0
        end
        if current ~= ARGV[1] then
            return -1
        end
        redis.call('SET', KEYS[1], ARGV[2])
        return 1
        ",
    );

    let outcome: i32 = script
        .key(post_key(&post.id))
        .arg(expected_json)
        .arg(json)
        .invoke_async(con)
        .await?;

    Ok(match outcome {
        1 => UpdateOutcome::Updated,
        0 => UpdateOutcome::Missing,
        _ => UpdateOutcome::Stale,
    })
}

/// Delete a post, cleaning up the global index and the owner's SET.
///
/// A Lua script fetches the record (for owner_id), deletes it and removes
/// it from both indexes atomically. Returns the deleted post, or None if it
/// didn't exist.
pub async fn delete_post<C>(con: &mut C, id: &str) -> Result<Option<StoredPost>, StoreError>
where
    C: AsyncCommands,
{
    // Key prefix passed as ARGV to avoid hardcoding in Lua
    let script = redis::Script::new(
        r#"
        local val = redis.call('GET', KEYS[1])
        if not val then
            return nil
        end
        redis.call('DEL', KEYS[1])
        redis.call('ZREM', KEYS[2], ARGV[1])
        local obj = cjson.decode(val)
        if type(obj.owner_id) == 'string' then
            redis.call('SREM', ARGV[2] .. obj.owner_id, ARGV[1])
        end
        return val
        "#,
    );

    let json: Option<String> = script
        .key(post_key(id))
        .key(POSTS_INDEX)
        .arg(id)
        .arg(USER_POSTS_PREFIX)
        .invoke_async(con)
        .await?;

    match json {
        Some(data) => Ok(Some(serde_json::from_str(&data)?)),
        None => Ok(None),
    }
}

/// Fetch the given posts in one MGET.
///
/// IDs whose record is gone are dropped; unreadable records are skipped and
/// logged.
async fn fetch_posts<C>(con: &mut C, ids: &[String]) -> Result<Vec<StoredPost>, StoreError>
where
    C: AsyncCommands,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let keys: Vec<String> = ids.iter().map(|id| post_key(id)).collect();
    // Explicit MGET: a single key must still come back as a one-element array.
    let values: Vec<Option<String>> = redis::cmd("MGET").arg(&keys).query_async(con).await?;

    let mut posts = Vec::with_capacity(values.len());
    for (key, value) in keys.iter().zip(values) {
        if let Some(data) = value {
            match serde_json::from_str::<StoredPost>(&data) {
                Ok(post) => posts.push(post),
                Err(e) => tracing::warn!(key = %key, error = %e, "Skipping unreadable post"),
            }
        }
    }

    sort_posts(&mut posts);
    Ok(posts)
}

/// List every post, oldest first.
pub async fn list_posts<C>(con: &mut C) -> Result<Vec<StoredPost>, StoreError>
where
    C: AsyncCommands,
{
    let ids: Vec<String> = con.zrange(POSTS_INDEX, 0, -1).await?;
    fetch_posts(con, &ids).await
}

/// List the posts owned by a user.
pub async fn list_user_posts<C>(con: &mut C, owner_id: &str) -> Result<Vec<StoredPost>, StoreError>
where
    C: AsyncCommands,
{
    let user_posts_key = format!("{}{}", USER_POSTS_PREFIX, owner_id);
    let ids: Vec<String> = con.smembers(&user_posts_key).await?;
    fetch_posts(con, &ids).await
}
