//! CRUD operations for the `comment` table.

use super::DbPool;
use crate::error::StoreError;

/// A comment on a (canonicalized) post.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: String,
    pub num_likes: i64,
    pub num_dislikes: i64,
}

/// Insert a comment on `post_id` (already canonicalized by the caller).
pub async fn insert_comment(
    pool: &DbPool,
    post_id: i64,
    user_id: i64,
    content: &str,
    created_at: &str,
) -> Result<i64, StoreError> {
    let result = sqlx::query(
        "INSERT INTO comment (post_id, user_id, content, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(post_id)
    .bind(user_id)
    .bind(content)
    .bind(created_at)
    .execute(pool)
    .await
    .map_err(|e| StoreError::Query { source: e })?;
    Ok(result.last_insert_rowid())
}

/// Fetch a comment by id.
pub async fn get_comment(pool: &DbPool, comment_id: i64) -> Result<Option<Comment>, StoreError> {
    sqlx::query_as::<_, Comment>("SELECT * FROM comment WHERE id = ?")
        .bind(comment_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })
}

/// Fetch every comment on a post, oldest first, used to hydrate `refresh`
/// results.
pub async fn comments_for_post(
    pool: &DbPool,
    post_id: i64,
) -> Result<Vec<Comment>, StoreError> {
    sqlx::query_as::<_, Comment>("SELECT * FROM comment WHERE post_id = ? ORDER BY id")
        .bind(post_id)
        .fetch_all(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })
}

/// Adjust `num_likes` by `delta`.
pub async fn adjust_num_likes(
    pool: &DbPool,
    comment_id: i64,
    delta: i64,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE comment SET num_likes = num_likes + ? WHERE id = ?")
        .bind(delta)
        .bind(comment_id)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(())
}

/// Adjust `num_dislikes` by `delta`.
pub async fn adjust_num_dislikes(
    pool: &DbPool,
    comment_id: i64,
    delta: i64,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE comment SET num_dislikes = num_dislikes + ? WHERE id = ?")
        .bind(delta)
        .bind(comment_id)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::init_test_db;
    use crate::store::posts::insert_common_post;

    #[tokio::test]
    async fn insert_and_fetch_comment() {
        let pool = init_test_db().await.unwrap();
        let post_id = insert_common_post(&pool, 1, "hi", "0").await.unwrap();
        let comment_id = insert_comment(&pool, post_id, 2, "nice post", "1")
            .await
            .unwrap();
        let comment = get_comment(&pool, comment_id).await.unwrap().unwrap();
        assert_eq!(comment.content, "nice post");
        assert_eq!(comment.post_id, post_id);
    }

    #[tokio::test]
    async fn comments_for_post_orders_oldest_first() {
        let pool = init_test_db().await.unwrap();
        let post_id = insert_common_post(&pool, 1, "hi", "0").await.unwrap();
        insert_comment(&pool, post_id, 2, "first", "1").await.unwrap();
        insert_comment(&pool, post_id, 3, "second", "2").await.unwrap();
        let comments = comments_for_post(&pool, post_id).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].content, "first");
    }

    #[tokio::test]
    async fn counters_adjust_independently() {
        let pool = init_test_db().await.unwrap();
        let post_id = insert_common_post(&pool, 1, "hi", "0").await.unwrap();
        let comment_id = insert_comment(&pool, post_id, 2, "c", "1").await.unwrap();
        adjust_num_likes(&pool, comment_id, 1).await.unwrap();
        adjust_num_dislikes(&pool, comment_id, 1).await.unwrap();
        let comment = get_comment(&pool, comment_id).await.unwrap().unwrap();
        assert_eq!(comment.num_likes, 1);
        assert_eq!(comment.num_dislikes, 1);
    }
}
