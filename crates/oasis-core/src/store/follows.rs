//! CRUD operations for the `follow` table.

use super::DbPool;
use crate::error::StoreError;

/// Insert a `(follower_id, followee_id)` edge. Returns `false` without
/// writing if the pair already exists.
pub async fn insert_follow(
    pool: &DbPool,
    follower_id: i64,
    followee_id: i64,
    created_at: &str,
) -> Result<bool, StoreError> {
    if exists(pool, follower_id, followee_id).await? {
        return Ok(false);
    }
    sqlx::query("INSERT INTO follow (follower_id, followee_id, created_at) VALUES (?, ?, ?)")
        .bind(follower_id)
        .bind(followee_id)
        .bind(created_at)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(true)
}

/// Remove a `(follower_id, followee_id)` edge. Returns `false` if no such
/// edge existed.
pub async fn delete_follow(
    pool: &DbPool,
    follower_id: i64,
    followee_id: i64,
) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM follow WHERE follower_id = ? AND followee_id = ?")
        .bind(follower_id)
        .bind(followee_id)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(result.rows_affected() > 0)
}

/// Check whether a follow edge already exists.
pub async fn exists(
    pool: &DbPool,
    follower_id: i64,
    followee_id: i64,
) -> Result<bool, StoreError> {
    let row: (i64,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM follow WHERE follower_id = ? AND followee_id = ?)",
    )
    .bind(follower_id)
    .bind(followee_id)
    .fetch_one(pool)
    .await
    .map_err(|e| StoreError::Query { source: e })?;
    Ok(row.0 == 1)
}

/// Ids of agents `user_id` follows.
pub async fn followees_of(pool: &DbPool, user_id: i64) -> Result<Vec<i64>, StoreError> {
    let rows: Vec<(i64,)> = sqlx::query_as("SELECT followee_id FROM follow WHERE follower_id = ?")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(rows.into_iter().map(|r| r.0).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::init_test_db;

    #[tokio::test]
    async fn insert_follow_then_duplicate_fails() {
        let pool = init_test_db().await.unwrap();
        assert!(insert_follow(&pool, 1, 2, "0").await.unwrap());
        assert!(!insert_follow(&pool, 1, 2, "1").await.unwrap());
    }

    #[tokio::test]
    async fn delete_follow_round_trips() {
        let pool = init_test_db().await.unwrap();
        insert_follow(&pool, 1, 2, "0").await.unwrap();
        assert!(delete_follow(&pool, 1, 2).await.unwrap());
        assert!(!exists(&pool, 1, 2).await.unwrap());
        assert!(!delete_follow(&pool, 1, 2).await.unwrap());
    }

    #[tokio::test]
    async fn followees_of_lists_targets() {
        let pool = init_test_db().await.unwrap();
        insert_follow(&pool, 1, 2, "0").await.unwrap();
        insert_follow(&pool, 1, 3, "0").await.unwrap();
        let mut followees = followees_of(&pool, 1).await.unwrap();
        followees.sort();
        assert_eq!(followees, vec![2, 3]);
    }
}
