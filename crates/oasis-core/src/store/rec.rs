//! CRUD operations for the `rec` table.
//!
//! `rec` is rewritten wholesale by every RecEngine refresh: cleared, then
//! repopulated in one batch insert per refresh.

use super::DbPool;
use crate::error::StoreError;

/// Clear the entire `rec` table and insert `(user_id, post_id)` pairs in one
/// transaction: every refresh rewrites the whole table, never a partial
/// update.
pub async fn replace_all(pool: &DbPool, rows: &[(i64, i64)]) -> Result<(), StoreError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| StoreError::Query { source: e })?;

    sqlx::query("DELETE FROM rec")
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Query { source: e })?;

    for (user_id, post_id) in rows {
        sqlx::query("INSERT INTO rec (user_id, post_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Query { source: e })?;
    }

    tx.commit().await.map_err(|e| StoreError::Query { source: e })?;
    Ok(())
}

/// All post ids recommended to `user_id` (spec's "rec slate").
pub async fn slate_for_user(pool: &DbPool, user_id: i64) -> Result<Vec<i64>, StoreError> {
    let rows: Vec<(i64,)> = sqlx::query_as("SELECT post_id FROM rec WHERE user_id = ?")
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
    async fn replace_all_clears_previous_rows() {
        let pool = init_test_db().await.unwrap();
        replace_all(&pool, &[(1, 10), (1, 11)]).await.unwrap();
        assert_eq!(slate_for_user(&pool, 1).await.unwrap().len(), 2);

        replace_all(&pool, &[(1, 20)]).await.unwrap();
        let slate = slate_for_user(&pool, 1).await.unwrap();
        assert_eq!(slate, vec![20]);
    }

    #[tokio::test]
    async fn slate_enforces_max_len_at_the_caller() {
        // The `rec` table itself has no cap; `max_rec_post_len` is enforced
        // by the RecEngine strategy before calling replace_all.
        let pool = init_test_db().await.unwrap();
        let rows: Vec<(i64, i64)> = (0..5).map(|i| (1, i)).collect();
        replace_all(&pool, &rows).await.unwrap();
        assert_eq!(slate_for_user(&pool, 1).await.unwrap().len(), 5);
    }
}
