//! CRUD operations for the `post` table.
//!
//! Canonicalization (reposts/quotes always resolve to their root before an
//! action applies) lives in [`canonicalize`]; callers in
//! [`crate::platform::handlers`] must call it before touching like/dislike/
//! report/repost/quote state.

use super::DbPool;
use crate::error::StoreError;

/// A post row. `original_post_id`/`content`/`quote_content` jointly encode
/// the post's type: `original_post_id` NULL means *common*;
/// `original_post_id` set with `content` NULL and `quote_content` NULL means
/// *repost*; `original_post_id` set with `quote_content` set means *quote*.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub original_post_id: Option<i64>,
    pub content: Option<String>,
    pub quote_content: Option<String>,
    pub created_at: String,
    pub num_likes: i64,
    pub num_dislikes: i64,
    pub num_shares: i64,
    pub num_reports: i64,
}

impl Post {
    /// `true` if this row has no `original_post_id` (a root/common post).
    pub fn is_root(&self) -> bool {
        self.original_post_id.is_none()
    }
}

/// Resolve `post_id` to its canonicalization target: the post itself if it
/// is a root, or its `original_post_id` if it is a repost.
///
/// Only *reposts* (no `content`, no `quote_content`) are transparent;
/// quotes are addressable posts in their own right, with their own
/// engagement, and are NOT canonicalized away even though they also carry
/// `original_post_id`.
pub async fn canonicalize(pool: &DbPool, post_id: i64) -> Result<Option<i64>, StoreError> {
    let Some(post) = get_post(pool, post_id).await? else {
        return Ok(None);
    };
    match (post.original_post_id, &post.content, &post.quote_content) {
        (Some(root), None, None) => Ok(Some(root)),
        _ => Ok(Some(post.id)),
    }
}

/// Insert a common post (`original_post_id = NULL`).
pub async fn insert_common_post(
    pool: &DbPool,
    user_id: i64,
    content: &str,
    created_at: &str,
) -> Result<i64, StoreError> {
    let result = sqlx::query(
        "INSERT INTO post (user_id, original_post_id, content, quote_content, created_at) \
         VALUES (?, NULL, ?, NULL, ?)",
    )
    .bind(user_id)
    .bind(content)
    .bind(created_at)
    .execute(pool)
    .await
    .map_err(|e| StoreError::Query { source: e })?;
    Ok(result.last_insert_rowid())
}

/// Insert a repost row (`content = NULL`, `quote_content = NULL`).
pub async fn insert_repost(
    pool: &DbPool,
    user_id: i64,
    root_post_id: i64,
    created_at: &str,
) -> Result<i64, StoreError> {
    let result = sqlx::query(
        "INSERT INTO post (user_id, original_post_id, content, quote_content, created_at) \
         VALUES (?, ?, NULL, NULL, ?)",
    )
    .bind(user_id)
    .bind(root_post_id)
    .bind(created_at)
    .execute(pool)
    .await
    .map_err(|e| StoreError::Query { source: e })?;
    Ok(result.last_insert_rowid())
}

/// Insert a quote row: copies the root's content and attaches
/// `quote_content`. Not idempotent — distinct quote content always succeeds.
pub async fn insert_quote(
    pool: &DbPool,
    user_id: i64,
    root_post_id: i64,
    root_content: Option<&str>,
    quote_content: &str,
    created_at: &str,
) -> Result<i64, StoreError> {
    let result = sqlx::query(
        "INSERT INTO post (user_id, original_post_id, content, quote_content, created_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(root_post_id)
    .bind(root_content)
    .bind(quote_content)
    .bind(created_at)
    .execute(pool)
    .await
    .map_err(|e| StoreError::Query { source: e })?;
    Ok(result.last_insert_rowid())
}

/// Fetch a post by id.
pub async fn get_post(pool: &DbPool, post_id: i64) -> Result<Option<Post>, StoreError> {
    sqlx::query_as::<_, Post>("SELECT * FROM post WHERE id = ?")
        .bind(post_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })
}

/// Fetch every post. Used by the RecEngine.
pub async fn list_posts(pool: &DbPool) -> Result<Vec<Post>, StoreError> {
    sqlx::query_as::<_, Post>("SELECT * FROM post ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })
}

/// Fetch posts by id, preserving input order where found.
pub async fn get_posts(pool: &DbPool, ids: &[i64]) -> Result<Vec<Post>, StoreError> {
    let mut out = Vec::with_capacity(ids.len());
    for &id in ids {
        if let Some(post) = get_post(pool, id).await? {
            out.push(post);
        }
    }
    Ok(out)
}

/// Whether `user_id` has already reposted `root_post_id`. The
/// idempotence check applies only to reposts, never to quotes.
pub async fn has_reposted(
    pool: &DbPool,
    user_id: i64,
    root_post_id: i64,
) -> Result<bool, StoreError> {
    let row: (i64,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM post WHERE user_id = ? AND original_post_id = ? \
         AND content IS NULL AND quote_content IS NULL)",
    )
    .bind(user_id)
    .bind(root_post_id)
    .fetch_one(pool)
    .await
    .map_err(|e| StoreError::Query { source: e })?;
    Ok(row.0 == 1)
}

/// Adjust `num_likes` by `delta`.
pub async fn adjust_num_likes(pool: &DbPool, post_id: i64, delta: i64) -> Result<(), StoreError> {
    sqlx::query("UPDATE post SET num_likes = num_likes + ? WHERE id = ?")
        .bind(delta)
        .bind(post_id)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(())
}

/// Adjust `num_dislikes` by `delta`.
pub async fn adjust_num_dislikes(
    pool: &DbPool,
    post_id: i64,
    delta: i64,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE post SET num_dislikes = num_dislikes + ? WHERE id = ?")
        .bind(delta)
        .bind(post_id)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(())
}

/// Adjust `num_shares` by `delta`. Only ever bumped on the root at repost
/// time.
pub async fn adjust_num_shares(pool: &DbPool, post_id: i64, delta: i64) -> Result<(), StoreError> {
    sqlx::query("UPDATE post SET num_shares = num_shares + ? WHERE id = ?")
        .bind(delta)
        .bind(post_id)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(())
}

/// Adjust `num_reports` by `delta`.
pub async fn adjust_num_reports(
    pool: &DbPool,
    post_id: i64,
    delta: i64,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE post SET num_reports = num_reports + ? WHERE id = ?")
        .bind(delta)
        .bind(post_id)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(())
}

/// Substring-match posts by content/quote_content or stringified id, backing
/// the `search_posts` handler.
pub async fn search_posts(pool: &DbPool, query: &str) -> Result<Vec<Post>, StoreError> {
    let pattern = format!("%{query}%");
    sqlx::query_as::<_, Post>(
        "SELECT * FROM post WHERE content LIKE ? OR quote_content LIKE ? OR CAST(id AS TEXT) LIKE ? \
         ORDER BY id",
    )
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .fetch_all(pool)
    .await
    .map_err(|e| StoreError::Query { source: e })
}

/// Top `top_k` posts created within the last `since` (an opaque,
/// lexicographically/numerically comparable created_at lower bound),
/// ordered by `num_likes` descending.
pub async fn trending_since(
    pool: &DbPool,
    since: &str,
    top_k: u32,
) -> Result<Vec<Post>, StoreError> {
    sqlx::query_as::<_, Post>(
        "SELECT * FROM post WHERE created_at >= ? ORDER BY num_likes DESC, id ASC LIMIT ?",
    )
    .bind(since)
    .bind(top_k)
    .fetch_all(pool)
    .await
    .map_err(|e| StoreError::Query { source: e })
}

/// Top-liked posts authored by any of `author_ids`, used by `refresh`'s
/// followee-post union.
pub async fn top_liked_by_authors(
    pool: &DbPool,
    author_ids: &[i64],
    limit: u32,
) -> Result<Vec<Post>, StoreError> {
    if author_ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = author_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
    let query_str = format!(
        "SELECT * FROM post WHERE user_id IN ({placeholders}) ORDER BY num_likes DESC, id ASC LIMIT ?"
    );
    let mut query = sqlx::query_as::<_, Post>(&query_str);
    for &id in author_ids {
        query = query.bind(id);
    }
    query = query.bind(limit);
    query
        .fetch_all(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })
}
