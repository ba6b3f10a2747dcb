//! CRUD operations for the append-only `trace` table.
//!
//! Every successful state-changing handler writes exactly one trace row.
//! Interview rows are the one case with a second write: the row is created
//! with `response = NULL` and later filled in by the Driver once the
//! follow-up LLM call completes, never as a second row (see DESIGN.md).

use super::DbPool;
use crate::error::StoreError;

/// An append-only audit log row.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Trace {
    pub id: i64,
    pub user_id: i64,
    pub action: String,
    pub info: Option<String>,
    pub response: Option<String>,
    pub created_at: String,
}

/// Append a trace row. `info` carries the minimum information to replay the
/// action (foreign ids, text payloads, created ids), serialized as JSON.
pub async fn insert_trace(
    pool: &DbPool,
    user_id: i64,
    action: &str,
    info: Option<&str>,
    created_at: &str,
) -> Result<i64, StoreError> {
    let result = sqlx::query(
        "INSERT INTO trace (user_id, action, info, response, created_at) VALUES (?, ?, ?, NULL, ?)",
    )
    .bind(user_id)
    .bind(action)
    .bind(info)
    .bind(created_at)
    .execute(pool)
    .await
    .map_err(|e| StoreError::Query { source: e })?;
    Ok(result.last_insert_rowid())
}

/// Fill in `response` on a previously created interview trace row.
pub async fn fill_response(
    pool: &DbPool,
    trace_id: i64,
    response: &str,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE trace SET response = ? WHERE id = ?")
        .bind(response)
        .bind(trace_id)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(())
}

/// Fetch a trace row by id.
pub async fn get_trace(pool: &DbPool, trace_id: i64) -> Result<Option<Trace>, StoreError> {
    sqlx::query_as::<_, Trace>("SELECT * FROM trace WHERE id = ?")
        .bind(trace_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })
}

/// Every trace row for `action`, oldest first. Used by §8's scenario
/// assertions ("no trace row with action `interview`...").
pub async fn traces_by_action(pool: &DbPool, action: &str) -> Result<Vec<Trace>, StoreError> {
    sqlx::query_as::<_, Trace>("SELECT * FROM trace WHERE action = ? ORDER BY id")
        .bind(action)
        .fetch_all(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })
}

/// Every trace row for `user_id`, oldest first.
pub async fn traces_for_user(pool: &DbPool, user_id: i64) -> Result<Vec<Trace>, StoreError> {
    sqlx::query_as::<_, Trace>("SELECT * FROM trace WHERE user_id = ? ORDER BY id")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })
}

/// Post ids the user has liked in trace order, used by the twitter legacy
/// strategy; derived independently from `post_like` here for callers that
/// want the trace view specifically.
pub async fn count_traces(pool: &DbPool) -> Result<i64, StoreError> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trace")
        .fetch_one(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(row.0)
}
