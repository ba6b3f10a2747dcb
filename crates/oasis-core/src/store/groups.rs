//! CRUD operations for `groups`/`group_member`/`group_message`.

use super::DbPool;
use crate::error::StoreError;

/// A simulated group (named `groups` at the SQL level to dodge the `GROUP`
/// keyword).
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

/// A message sent within a group.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct GroupMessage {
    pub id: i64,
    pub group_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub sent_at: String,
}

/// Create a group.
pub async fn insert_group(pool: &DbPool, name: &str, created_at: &str) -> Result<i64, StoreError> {
    let result = sqlx::query("INSERT INTO groups (name, created_at) VALUES (?, ?)")
        .bind(name)
        .bind(created_at)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(result.last_insert_rowid())
}

/// Fetch a group by id.
pub async fn get_group(pool: &DbPool, group_id: i64) -> Result<Option<Group>, StoreError> {
    sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = ?")
        .bind(group_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })
}

/// Add `agent_id` as a member of `group_id`. Returns `false` if already a
/// member.
pub async fn join_group(
    pool: &DbPool,
    group_id: i64,
    agent_id: i64,
    joined_at: &str,
) -> Result<bool, StoreError> {
    if is_member(pool, group_id, agent_id).await? {
        return Ok(false);
    }
    sqlx::query("INSERT INTO group_member (group_id, agent_id, joined_at) VALUES (?, ?, ?)")
        .bind(group_id)
        .bind(agent_id)
        .bind(joined_at)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(true)
}

/// Remove `agent_id` from `group_id`. Returns `false` if not a member.
pub async fn leave_group(
    pool: &DbPool,
    group_id: i64,
    agent_id: i64,
) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM group_member WHERE group_id = ? AND agent_id = ?")
        .bind(group_id)
        .bind(agent_id)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(result.rows_affected() > 0)
}

/// Whether `agent_id` is currently a member of `group_id`.
pub async fn is_member(pool: &DbPool, group_id: i64, agent_id: i64) -> Result<bool, StoreError> {
    let row: (i64,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM group_member WHERE group_id = ? AND agent_id = ?)",
    )
    .bind(group_id)
    .bind(agent_id)
    .fetch_one(pool)
    .await
    .map_err(|e| StoreError::Query { source: e })?;
    Ok(row.0 == 1)
}

/// Append a message. Caller must have already verified `sender_id` is a
/// current member at send time.
pub async fn send_message(
    pool: &DbPool,
    group_id: i64,
    sender_id: i64,
    content: &str,
    sent_at: &str,
) -> Result<i64, StoreError> {
    let result = sqlx::query(
        "INSERT INTO group_message (group_id, sender_id, content, sent_at) VALUES (?, ?, ?, ?)",
    )
    .bind(group_id)
    .bind(sender_id)
    .bind(content)
    .bind(sent_at)
    .execute(pool)
    .await
    .map_err(|e| StoreError::Query { source: e })?;
    Ok(result.last_insert_rowid())
}

/// Messages visible to `agent_id`: every message in every group they are
/// currently a member of, oldest first.
pub async fn messages_for_member(
    pool: &DbPool,
    agent_id: i64,
) -> Result<Vec<GroupMessage>, StoreError> {
    sqlx::query_as::<_, GroupMessage>(
        "SELECT gm.* FROM group_message gm \
         JOIN group_member mem ON mem.group_id = gm.group_id \
         WHERE mem.agent_id = ? \
         ORDER BY gm.id",
    )
    .bind(agent_id)
    .fetch_all(pool)
    .await
    .map_err(|e| StoreError::Query { source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::init_test_db;

    #[tokio::test]
    async fn join_then_duplicate_is_noop() {
        let pool = init_test_db().await.unwrap();
        let group_id = insert_group(&pool, "rustaceans", "0").await.unwrap();
        assert!(join_group(&pool, group_id, 1, "0").await.unwrap());
        assert!(!join_group(&pool, group_id, 1, "1").await.unwrap());
    }

    #[tokio::test]
    async fn leave_group_removes_membership() {
        let pool = init_test_db().await.unwrap();
        let group_id = insert_group(&pool, "rustaceans", "0").await.unwrap();
        join_group(&pool, group_id, 1, "0").await.unwrap();
        assert!(leave_group(&pool, group_id, 1).await.unwrap());
        assert!(!is_member(&pool, group_id, 1).await.unwrap());
    }

    #[tokio::test]
    async fn messages_for_member_only_sees_their_groups() {
        let pool = init_test_db().await.unwrap();
        let g1 = insert_group(&pool, "g1", "0").await.unwrap();
        let g2 = insert_group(&pool, "g2", "0").await.unwrap();
        join_group(&pool, g1, 1, "0").await.unwrap();
        join_group(&pool, g2, 2, "0").await.unwrap();
        send_message(&pool, g1, 1, "hi g1", "1").await.unwrap();
        send_message(&pool, g2, 2, "hi g2", "1").await.unwrap();

        let messages = messages_for_member(&pool, 1).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hi g1");
    }
}
