//! CRUD operations for the `mute` table.

use super::DbPool;
use crate::error::StoreError;

/// Insert a `(muter_id, mutee_id)` pair. Returns `false` if it already
/// exists.
pub async fn insert_mute(
    pool: &DbPool,
    muter_id: i64,
    mutee_id: i64,
    created_at: &str,
) -> Result<bool, StoreError> {
    if exists(pool, muter_id, mutee_id).await? {
        return Ok(false);
    }
    sqlx::query("INSERT INTO mute (muter_id, mutee_id, created_at) VALUES (?, ?, ?)")
        .bind(muter_id)
        .bind(mutee_id)
        .bind(created_at)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(true)
}

/// Remove a `(muter_id, mutee_id)` pair. Returns `false` if none existed.
pub async fn delete_mute(pool: &DbPool, muter_id: i64, mutee_id: i64) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM mute WHERE muter_id = ? AND mutee_id = ?")
        .bind(muter_id)
        .bind(mutee_id)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(result.rows_affected() > 0)
}

/// Check whether a mute already exists.
pub async fn exists(pool: &DbPool, muter_id: i64, mutee_id: i64) -> Result<bool, StoreError> {
    let row: (i64,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM mute WHERE muter_id = ? AND mutee_id = ?)")
            .bind(muter_id)
            .bind(mutee_id)
            .fetch_one(pool)
            .await
            .map_err(|e| StoreError::Query { source: e })?;
    Ok(row.0 == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::init_test_db;

    #[tokio::test]
    async fn insert_mute_then_duplicate_fails() {
        let pool = init_test_db().await.unwrap();
        assert!(insert_mute(&pool, 1, 2, "0").await.unwrap());
        assert!(!insert_mute(&pool, 1, 2, "1").await.unwrap());
    }

    #[tokio::test]
    async fn delete_mute_round_trips() {
        let pool = init_test_db().await.unwrap();
        insert_mute(&pool, 1, 2, "0").await.unwrap();
        assert!(delete_mute(&pool, 1, 2).await.unwrap());
        assert!(!exists(&pool, 1, 2).await.unwrap());
    }
}
