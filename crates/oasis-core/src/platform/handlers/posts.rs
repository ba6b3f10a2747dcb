//! `refresh`, `create_post`, `repost`, `quote_post`, `search_posts`, `trend`.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use serde_json::{json, Value};

use crate::error::PlatformError;
use crate::store;

use super::{arg_i64, arg_str, as_object, current_user, Ctx, Outcome};

/// `refresh[]` → up to `refresh_rec_post_count` posts drawn uniformly at
/// random from the sender's `rec` rows, union'd (on non-Reddit platforms)
/// with up to `following_post_count` top-liked posts by followees. The
/// result is de-duplicated and hydrated with each post's comments.
pub async fn refresh(ctx: &mut Ctx<'_>, agent_id: i64) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;

    let mut rec_ids = store::rec::slate_for_user(ctx.pool, user.id).await?;
    rec_ids.shuffle(&mut rand::thread_rng());
    rec_ids.truncate(ctx.config.refresh_rec_post_count as usize);

    let mut ids: Vec<i64> = rec_ids;
    if !matches!(ctx.config.recsys_type, crate::config::RecsysType::Reddit) {
        let followee_ids: Vec<i64> = ctx.graph.following(user.id).copied().collect();
        let followee_posts = store::posts::top_liked_by_authors(
            ctx.pool,
            &followee_ids,
            ctx.config.following_post_count,
        )
        .await?;
        ids.extend(followee_posts.into_iter().map(|p| p.id));
    }

    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(*id));

    if ids.is_empty() {
        return Err(PlatformError::Precondition("No posts found".to_string()));
    }

    let posts = store::posts::get_posts(ctx.pool, &ids).await?;
    let mut hydrated = Vec::with_capacity(posts.len());
    for post in posts {
        let comments = store::comments::comments_for_post(ctx.pool, post.id).await?;
        hydrated.push(json!({
            "post": post,
            "comments": comments,
        }));
    }

    Ok(Outcome::untraced(json!(hydrated)))
}

/// `create_post[content]` → `{post_id}`. Type = common.
pub async fn create_post(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let map = as_object(payload)?;
    let content = arg_str(map, "content")?;

    let post_id = store::posts::insert_common_post(ctx.pool, user.id, &content, &ctx.clock.now()).await?;

    Ok(Outcome::traced(
        json!({ "post_id": post_id }),
        "create_post",
        json!({ "post_id": post_id, "content": content }),
    ))
}

/// `repost[post_id]` → `{post_id}`. Canonicalizes; fails if the sender has
/// already reposted this root.
pub async fn repost(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let map = as_object(payload)?;
    let target_id = arg_i64(map, "post_id")?;

    let root_id = store::posts::canonicalize(ctx.pool, target_id)
        .await?
        .ok_or_else(|| PlatformError::Precondition(format!("no such post {target_id}")))?;

    if store::posts::has_reposted(ctx.pool, user.id, root_id).await? {
        return Err(PlatformError::Precondition(
            "already reposted this post".to_string(),
        ));
    }

    let repost_id = store::posts::insert_repost(ctx.pool, user.id, root_id, &ctx.clock.now()).await?;
    store::posts::adjust_num_shares(ctx.pool, root_id, 1).await?;

    Ok(Outcome::traced(
        json!({ "post_id": repost_id }),
        "repost",
        json!({ "post_id": repost_id, "original_post_id": root_id }),
    ))
}

/// `quote_post[post_id, quote_content]` → `{post_id}`. Copies root content,
/// attaches `quote_content`. Not idempotent.
pub async fn quote_post(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let map = as_object(payload)?;
    let target_id = arg_i64(map, "post_id")?;
    let quote_content = arg_str(map, "quote_content")?;

    let root_id = store::posts::canonicalize(ctx.pool, target_id)
        .await?
        .ok_or_else(|| PlatformError::Precondition(format!("no such post {target_id}")))?;
    let root = store::posts::get_post(ctx.pool, root_id)
        .await?
        .ok_or_else(|| PlatformError::Precondition(format!("no such post {root_id}")))?;

    let quote_id = store::posts::insert_quote(
        ctx.pool,
        user.id,
        root_id,
        root.content.as_deref(),
        &quote_content,
        &ctx.clock.now(),
    )
    .await?;

    Ok(Outcome::traced(
        json!({ "post_id": quote_id }),
        "quote_post",
        json!({ "post_id": quote_id, "original_post_id": root_id }),
    ))
}

/// `search_posts[query]` — substring match, hydrated rows. Read-only: no
/// trace row.
pub async fn search_posts(ctx: &mut Ctx<'_>, payload: &Value) -> Result<Outcome, PlatformError> {
    let map = as_object(payload)?;
    let query = arg_str(map, "query")?;
    let posts = store::posts::search_posts(ctx.pool, &query).await?;
    Ok(Outcome::untraced(json!(posts)))
}

/// `trend[]` — top `trend_top_k` posts created within the last
/// `trend_num_days` of virtual time, ordered by `num_likes` descending.
/// Read-only: no trace row.
pub async fn trend(ctx: &mut Ctx<'_>) -> Result<Outcome, PlatformError> {
    let since = ctx.clock.since_virtual_days(ctx.config.trend_num_days);
    let posts = store::posts::trending_since(ctx.pool, &since, ctx.config.trend_top_k).await?;
    Ok(Outcome::untraced(json!(posts)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_graph::AgentGraph;
    use crate::clock::Clock;
    use crate::config::Config;
    use crate::store::init_test_db;

    async fn signed_up_user(pool: &store::DbPool, agent_id: i64) -> i64 {
        store::users::insert_user(pool, agent_id, "h", "H", "", "0").await.unwrap()
    }

    #[tokio::test]
    async fn refresh_fails_with_no_posts_found_when_empty() {
        let pool = init_test_db().await.unwrap();
        signed_up_user(&pool, 1).await;
        let clock = Clock::new_tick();
        let mut graph = AgentGraph::new();
        let config = Config::default();
        let mut ctx = Ctx { pool: &pool, clock: &clock, graph: &mut graph, config: &config };

        let err = refresh(&mut ctx, 1).await.unwrap_err();
        assert!(matches!(err, PlatformError::Precondition(ref msg) if msg == "No posts found"));
    }

    #[tokio::test]
    async fn repost_twice_fails_second_time() {
        let pool = init_test_db().await.unwrap();
        let author = signed_up_user(&pool, 1).await;
        let reposter_agent = 2;
        signed_up_user(&pool, reposter_agent).await;
        let post_id = store::posts::insert_common_post(&pool, author, "hi", "0").await.unwrap();

        let clock = Clock::new_tick();
        let mut graph = AgentGraph::new();
        let config = Config::default();
        let mut ctx = Ctx { pool: &pool, clock: &clock, graph: &mut graph, config: &config };

        let payload = json!({ "post_id": post_id });
        repost(&mut ctx, reposter_agent, &payload).await.unwrap();
        let err = repost(&mut ctx, reposter_agent, &payload).await.unwrap_err();
        assert!(matches!(err, PlatformError::Precondition(_)));
    }

    #[tokio::test]
    async fn quote_post_twice_succeeds_both_times() {
        let pool = init_test_db().await.unwrap();
        let author = signed_up_user(&pool, 1).await;
        signed_up_user(&pool, 2).await;
        let post_id = store::posts::insert_common_post(&pool, author, "hi", "0").await.unwrap();

        let clock = Clock::new_tick();
        let mut graph = AgentGraph::new();
        let config = Config::default();
        let mut ctx = Ctx { pool: &pool, clock: &clock, graph: &mut graph, config: &config };

        let first = quote_post(&mut ctx, 2, &json!({ "post_id": post_id, "quote_content": "nice" }))
            .await
            .unwrap();
        let second = quote_post(&mut ctx, 2, &json!({ "post_id": post_id, "quote_content": "still nice" }))
            .await
            .unwrap();
        assert_ne!(first.data["post_id"], second.data["post_id"]);
    }
}
