//! CRUD operations for `post_like`/`post_dislike` and their comment
//! counterparts.

use super::DbPool;
use crate::error::StoreError;

/// Which rating table a helper call targets.
#[derive(Debug, Clone, Copy)]
pub enum Target {
    Post,
    Comment,
}

impl Target {
    fn like_table(self) -> &'static str {
        match self {
            Target::Post => "post_like",
            Target::Comment => "comment_like",
        }
    }
    fn dislike_table(self) -> &'static str {
        match self {
            Target::Post => "post_dislike",
            Target::Comment => "comment_dislike",
        }
    }
    fn fk_column(self) -> &'static str {
        match self {
            Target::Post => "post_id",
            Target::Comment => "comment_id",
        }
    }
}

/// Insert a like row. Returns `false` if `(user_id, target_id)` already
/// liked.
pub async fn insert_like(
    pool: &DbPool,
    target: Target,
    user_id: i64,
    target_id: i64,
    created_at: &str,
) -> Result<bool, StoreError> {
    if has_like(pool, target, user_id, target_id).await? {
        return Ok(false);
    }
    let sql = format!(
        "INSERT INTO {} (user_id, {}, created_at) VALUES (?, ?, ?)",
        target.like_table(),
        target.fk_column()
    );
    sqlx::query(&sql)
        .bind(user_id)
        .bind(target_id)
        .bind(created_at)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(true)
}

/// Remove a like row. Returns `false` if none existed.
pub async fn delete_like(
    pool: &DbPool,
    target: Target,
    user_id: i64,
    target_id: i64,
) -> Result<bool, StoreError> {
    let sql = format!(
        "DELETE FROM {} WHERE user_id = ? AND {} = ?",
        target.like_table(),
        target.fk_column()
    );
    let result = sqlx::query(&sql)
        .bind(user_id)
        .bind(target_id)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(result.rows_affected() > 0)
}

/// Insert a dislike row. Returns `false` if already disliked.
pub async fn insert_dislike(
    pool: &DbPool,
    target: Target,
    user_id: i64,
    target_id: i64,
    created_at: &str,
) -> Result<bool, StoreError> {
    if has_dislike(pool, target, user_id, target_id).await? {
        return Ok(false);
    }
    let sql = format!(
        "INSERT INTO {} (user_id, {}, created_at) VALUES (?, ?, ?)",
        target.dislike_table(),
        target.fk_column()
    );
    sqlx::query(&sql)
        .bind(user_id)
        .bind(target_id)
        .bind(created_at)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(true)
}

/// Remove a dislike row. Returns `false` if none existed.
pub async fn delete_dislike(
    pool: &DbPool,
    target: Target,
    user_id: i64,
    target_id: i64,
) -> Result<bool, StoreError> {
    let sql = format!(
        "DELETE FROM {} WHERE user_id = ? AND {} = ?",
        target.dislike_table(),
        target.fk_column()
    );
    let result = sqlx::query(&sql)
        .bind(user_id)
        .bind(target_id)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(result.rows_affected() > 0)
}

/// Whether `(user_id, target_id)` already holds a like.
pub async fn has_like(
    pool: &DbPool,
    target: Target,
    user_id: i64,
    target_id: i64,
) -> Result<bool, StoreError> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE user_id = ? AND {} = ?)",
        target.like_table(),
        target.fk_column()
    );
    let row: (i64,) = sqlx::query_as(&sql)
        .bind(user_id)
        .bind(target_id)
        .fetch_one(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(row.0 == 1)
}

/// Whether `(user_id, target_id)` already holds a dislike.
pub async fn has_dislike(
    pool: &DbPool,
    target: Target,
    user_id: i64,
    target_id: i64,
) -> Result<bool, StoreError> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE user_id = ? AND {} = ?)",
        target.dislike_table(),
        target.fk_column()
    );
    let row: (i64,) = sqlx::query_as(&sql)
        .bind(user_id)
        .bind(target_id)
        .fetch_one(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(row.0 == 1)
}

/// The post ids a user has liked, most recent first, used by the twhin
/// RecEngine's like-affinity term.
pub async fn recent_liked_post_ids(
    pool: &DbPool,
    user_id: i64,
    limit: u32,
) -> Result<Vec<i64>, StoreError> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "SELECT post_id FROM post_like WHERE user_id = ? ORDER BY id DESC LIMIT ?",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| StoreError::Query { source: e })?;
    Ok(rows.into_iter().map(|r| r.0).collect())
}

/// All post ids a user has either liked or disliked, used by the twitter
/// legacy strategy's trace-similarity term.
pub async fn liked_and_disliked_post_ids(
    pool: &DbPool,
    user_id: i64,
) -> Result<(Vec<i64>, Vec<i64>), StoreError> {
    let liked: Vec<(i64,)> = sqlx::query_as("SELECT post_id FROM post_like WHERE user_id = ?")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    let disliked: Vec<(i64,)> =
        sqlx::query_as("SELECT post_id FROM post_dislike WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(|e| StoreError::Query { source: e })?;
    Ok((
        liked.into_iter().map(|r| r.0).collect(),
        disliked.into_iter().map(|r| r.0).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::init_test_db;

    #[tokio::test]
    async fn insert_like_then_duplicate_fails() {
        let pool = init_test_db().await.unwrap();
        assert!(insert_like(&pool, Target::Post, 1, 10, "0").await.unwrap());
        assert!(!insert_like(&pool, Target::Post, 1, 10, "1").await.unwrap());
    }

    #[tokio::test]
    async fn delete_like_round_trips() {
        let pool = init_test_db().await.unwrap();
        insert_like(&pool, Target::Post, 1, 10, "0").await.unwrap();
        assert!(delete_like(&pool, Target::Post, 1, 10).await.unwrap());
        assert!(!has_like(&pool, Target::Post, 1, 10).await.unwrap());
        assert!(!delete_like(&pool, Target::Post, 1, 10).await.unwrap());
    }

    #[tokio::test]
    async fn like_and_dislike_are_independent_tables() {
        let pool = init_test_db().await.unwrap();
        insert_like(&pool, Target::Post, 1, 10, "0").await.unwrap();
        insert_dislike(&pool, Target::Post, 2, 10, "0")
            .await
            .unwrap();
        assert!(has_like(&pool, Target::Post, 1, 10).await.unwrap());
        assert!(!has_dislike(&pool, Target::Post, 1, 10).await.unwrap());
        assert!(has_dislike(&pool, Target::Post, 2, 10).await.unwrap());
    }

    #[tokio::test]
    async fn comment_rating_uses_comment_id_column() {
        let pool = init_test_db().await.unwrap();
        assert!(insert_like(&pool, Target::Comment, 1, 5, "0")
            .await
            .unwrap());
        assert!(has_like(&pool, Target::Comment, 1, 5).await.unwrap());
    }

    #[tokio::test]
    async fn recent_liked_post_ids_orders_newest_first() {
        let pool = init_test_db().await.unwrap();
        insert_like(&pool, Target::Post, 1, 10, "0").await.unwrap();
        insert_like(&pool, Target::Post, 1, 11, "1").await.unwrap();
        let recent = recent_liked_post_ids(&pool, 1, 5).await.unwrap();
        assert_eq!(recent, vec![11, 10]);
    }
}
