//! CRUD operations for the `report` table.

use super::DbPool;
use crate::error::StoreError;

/// Insert a report. Returns `false` if `(user_id, post_id)` was already
/// reported by this user.
pub async fn insert_report(
    pool: &DbPool,
    user_id: i64,
    post_id: i64,
    reason: &str,
    created_at: &str,
) -> Result<bool, StoreError> {
    if exists(pool, user_id, post_id).await? {
        return Ok(false);
    }
    sqlx::query(
        "INSERT INTO report (user_id, post_id, reason, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(post_id)
    .bind(reason)
    .bind(created_at)
    .execute(pool)
    .await
    .map_err(|e| StoreError::Query { source: e })?;
    Ok(true)
}

/// Whether `(user_id, post_id)` has already been reported by this user.
pub async fn exists(pool: &DbPool, user_id: i64, post_id: i64) -> Result<bool, StoreError> {
    let row: (i64,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM report WHERE user_id = ? AND post_id = ?)",
    )
    .bind(user_id)
    .bind(post_id)
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
    async fn insert_report_then_duplicate_fails() {
        let pool = init_test_db().await.unwrap();
        assert!(insert_report(&pool, 1, 10, "spam", "0").await.unwrap());
        assert!(!insert_report(&pool, 1, 10, "spam again", "1").await.unwrap());
    }
}
