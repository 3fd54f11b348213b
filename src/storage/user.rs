//! Principal Redis operations.
//!
//! Redis key patterns:
//! - `user:{nanoid}`: principal data (JSON, includes the password hash)
//! - `email:{email}`: email lookup to user_id (STRING, written with NX)
//!
//! User JSON holds a password hash, so the raw string is wrapped in
//! `Zeroizing` and cleared once deserialized.

use super::StoreError;
use crate::models::StoredUser;
use redis::AsyncCommands;
use zeroize::Zeroizing;

fn user_key(id: &str) -> String {
    format!("user:{}", id)
}

fn email_key(email: &str) -> String {
    format!("email:{}", email)
}

/// Store a new user.
///
/// Claims the email index with `SET NX` first; a taken email is a
/// [`StoreError::Conflict`] and nothing is written.
pub async fn create_user<C>(con: &mut C, user: &StoredUser) -> Result<(), StoreError>
where
    C: AsyncCommands,
{
    let email_key = email_key(&user.email);
    let json = Zeroizing::new(serde_json::to_string(user)?);

    let claimed: bool = con.set_nx(&email_key, &user.id).await?;
    if !claimed {
        return Err(StoreError::Conflict("Email already registered".to_string()));
    }

    if let Err(e) = con.set::<_, _, ()>(user_key(&user.id), json.as_str()).await {
        // Release the email so a retry can succeed.
        let _: Result<(), _> = con.del(&email_key).await;
        return Err(e.into());
    }

    Ok(())
}

/// Get a user by ID.
pub async fn get_user<C>(con: &mut C, id: &str) -> Result<Option<StoredUser>, StoreError>
where
    C: AsyncCommands,
{
    let json: Option<String> = con.get(user_key(id)).await?;

    match json {
        Some(data) => {
            let data = Zeroizing::new(data);
            Ok(Some(serde_json::from_str(&data)?))
        }
        None => Ok(None),
    }
}

/// Get a user by email.
///
/// Two-step lookup: email -> user_id -> user data.
pub async fn get_user_by_email<C>(
    con: &mut C,
    email: &str,
) -> Result<Option<StoredUser>, StoreError>
where
    C: AsyncCommands,
{
    let user_id: Option<String> = con.get(email_key(email)).await?;

    match user_id {
        Some(id) => get_user(con, &id).await,
        None => Ok(None),
    }
}
