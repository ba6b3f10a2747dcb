//! `create_comment`.

use serde_json::{json, Value};

use crate::error::PlatformError;
use crate::store;

use super::{arg_i64, arg_str, as_object, current_user, Ctx, Outcome};

/// `create_comment[post_id, content]` → `{comment_id}`. Canonicalizes the
/// target post before attaching the comment.
pub async fn create_comment(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let map = as_object(payload)?;
    let target_id = arg_i64(map, "post_id")?;
    let content = arg_str(map, "content")?;

    let root_id = store::posts::canonicalize(ctx.pool, target_id)
        .await?
        .ok_or_else(|| PlatformError::Precondition(format!("no such post {target_id}")))?;

    let comment_id =
        store::comments::insert_comment(ctx.pool, root_id, user.id, &content, &ctx.clock.now()).await?;

    Ok(Outcome::traced(
        json!({ "comment_id": comment_id }),
        "create_comment",
        json!({ "comment_id": comment_id, "post_id": root_id, "content": content }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_graph::AgentGraph;
    use crate::clock::Clock;
    use crate::config::Config;
    use crate::store::init_test_db;

    #[tokio::test]
    async fn create_comment_canonicalizes_to_root() {
        let pool = init_test_db().await.unwrap();
        let author = store::users::insert_user(&pool, 1, "a", "A", "", "0").await.unwrap();
        let reposter = store::users::insert_user(&pool, 2, "b", "B", "", "0").await.unwrap();
        let commenter = store::users::insert_user(&pool, 3, "c", "C", "", "0").await.unwrap();
        let _ = commenter;
        let root = store::posts::insert_common_post(&pool, author, "hi", "0").await.unwrap();
        let repost = store::posts::insert_repost(&pool, reposter, root, "1").await.unwrap();

        let clock = Clock::new_tick();
        let mut graph = AgentGraph::new();
        let config = Config::default();
        let mut ctx = Ctx { pool: &pool, clock: &clock, graph: &mut graph, config: &config };

        let outcome = create_comment(&mut ctx, 3, &json!({ "post_id": repost, "content": "nice" }))
            .await
            .unwrap();
        let comment_id = outcome.data["comment_id"].as_i64().unwrap();
        let comment = store::comments::get_comment(&pool, comment_id).await.unwrap().unwrap();
        assert_eq!(comment.post_id, root);
    }
}
