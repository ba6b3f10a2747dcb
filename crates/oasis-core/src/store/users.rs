//! CRUD operations for the `user` table.

use super::DbPool;
use crate::error::StoreError;

/// A registered simulation participant.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct User {
    pub id: i64,
    pub agent_id: i64,
    pub handle: String,
    pub display_name: String,
    pub bio: String,
    pub created_at: String,
    pub num_followings: i64,
    pub num_followers: i64,
}

/// Insert a new user with `agent_id = id = sender.agent_id` per the
/// `sign_up` handler's contract.
pub async fn insert_user(
    pool: &DbPool,
    agent_id: i64,
    handle: &str,
    display_name: &str,
    bio: &str,
    created_at: &str,
) -> Result<i64, StoreError> {
    let result = sqlx::query(
        "INSERT INTO user (agent_id, handle, display_name, bio, created_at, num_followings, num_followers) \
         VALUES (?, ?, ?, ?, ?, 0, 0)",
    )
    .bind(agent_id)
    .bind(handle)
    .bind(display_name)
    .bind(bio)
    .bind(created_at)
    .execute(pool)
    .await
    .map_err(|e| StoreError::Query { source: e })?;

    Ok(result.last_insert_rowid())
}

/// Fetch a user by primary key.
pub async fn get_user(pool: &DbPool, user_id: i64) -> Result<Option<User>, StoreError> {
    sqlx::query_as::<_, User>("SELECT * FROM user WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })
}

/// Fetch a user by `agent_id`.
pub async fn get_user_by_agent_id(
    pool: &DbPool,
    agent_id: i64,
) -> Result<Option<User>, StoreError> {
    sqlx::query_as::<_, User>("SELECT * FROM user WHERE agent_id = ?")
        .bind(agent_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })
}

/// Fetch every registered user. Used by the RecEngine and `search_user`.
pub async fn list_users(pool: &DbPool) -> Result<Vec<User>, StoreError> {
    sqlx::query_as::<_, User>("SELECT * FROM user ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })
}

/// Substring-match users by handle, display name, or bio.
pub async fn search_users(pool: &DbPool, query: &str) -> Result<Vec<User>, StoreError> {
    let pattern = format!("%{query}%");
    sqlx::query_as::<_, User>(
        "SELECT * FROM user \
         WHERE handle LIKE ? OR display_name LIKE ? OR bio LIKE ? OR CAST(id AS TEXT) LIKE ? \
         ORDER BY id",
    )
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .fetch_all(pool)
    .await
    .map_err(|e| StoreError::Query { source: e })
}

/// Adjust `num_followings` by `delta` (positive on follow, negative on
/// unfollow).
pub async fn adjust_num_followings(
    pool: &DbPool,
    user_id: i64,
    delta: i64,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE user SET num_followings = num_followings + ? WHERE id = ?")
        .bind(delta)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(())
}

/// Adjust `num_followers` by `delta`.
pub async fn adjust_num_followers(
    pool: &DbPool,
    user_id: i64,
    delta: i64,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE user SET num_followers = num_followers + ? WHERE id = ?")
        .bind(delta)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(())
}
