//! `follow`, `unfollow`, `mute`, `unmute`, `search_user`.
//!
//! Follow/unfollow mutate the [`crate::agent_graph::AgentGraph`] and the
//! `follow` table atomically within the same single-writer step.

use serde_json::{json, Value};

use crate::error::PlatformError;
use crate::store;

use super::{arg_i64, arg_str, as_object, current_user, Ctx, Outcome};

/// `follow[followee_id]` — fails on self-follow, unknown followee, or an
/// existing edge.
pub async fn follow(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let map = as_object(payload)?;
    let followee_id = arg_i64(map, "followee_id")?;

    if followee_id == user.id {
        return Err(PlatformError::Precondition("cannot follow self".to_string()));
    }
    store::users::get_user(ctx.pool, followee_id)
        .await?
        .ok_or_else(|| PlatformError::Precondition(format!("no such user {followee_id}")))?;

    if !store::follows::insert_follow(ctx.pool, user.id, followee_id, &ctx.clock.now()).await? {
        return Err(PlatformError::Precondition("already following".to_string()));
    }
    store::users::adjust_num_followings(ctx.pool, user.id, 1).await?;
    store::users::adjust_num_followers(ctx.pool, followee_id, 1).await?;
    ctx.graph.add_edge(user.id, followee_id);

    Ok(Outcome::traced(
        json!({ "followee_id": followee_id }),
        "follow",
        json!({ "followee_id": followee_id }),
    ))
}

/// `unfollow[followee_id]` — fails if no such edge exists.
pub async fn unfollow(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let map = as_object(payload)?;
    let followee_id = arg_i64(map, "followee_id")?;

    if !store::follows::delete_follow(ctx.pool, user.id, followee_id).await? {
        return Err(PlatformError::Precondition("not following".to_string()));
    }
    store::users::adjust_num_followings(ctx.pool, user.id, -1).await?;
    store::users::adjust_num_followers(ctx.pool, followee_id, -1).await?;
    ctx.graph.remove_edge(user.id, followee_id);

    Ok(Outcome::traced(
        json!({ "followee_id": followee_id }),
        "unfollow",
        json!({ "followee_id": followee_id }),
    ))
}

/// `mute[mutee_id]` — fails on an existing mute pair.
pub async fn mute(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let map = as_object(payload)?;
    let mutee_id = arg_i64(map, "mutee_id")?;

    if !store::mutes::insert_mute(ctx.pool, user.id, mutee_id, &ctx.clock.now()).await? {
        return Err(PlatformError::Precondition("already muted".to_string()));
    }

    Ok(Outcome::traced(
        json!({ "mutee_id": mutee_id }),
        "mute",
        json!({ "mutee_id": mutee_id }),
    ))
}

/// `unmute[mutee_id]` — fails if no such mute exists.
pub async fn unmute(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let map = as_object(payload)?;
    let mutee_id = arg_i64(map, "mutee_id")?;

    if !store::mutes::delete_mute(ctx.pool, user.id, mutee_id).await? {
        return Err(PlatformError::Precondition("not muted".to_string()));
    }

    Ok(Outcome::traced(
        json!({ "mutee_id": mutee_id }),
        "unmute",
        json!({ "mutee_id": mutee_id }),
    ))
}

/// `search_user[query]` — substring match, hydrated rows. Read-only: no
/// trace row.
pub async fn search_user(ctx: &mut Ctx<'_>, payload: &Value) -> Result<Outcome, PlatformError> {
    let map = as_object(payload)?;
    let query = arg_str(map, "query")?;
    let users = store::users::search_users(ctx.pool, &query).await?;
    Ok(Outcome::untraced(json!(users)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_graph::AgentGraph;
    use crate::clock::Clock;
    use crate::config::Config;
    use crate::store::init_test_db;

    async fn fixture() -> (store::DbPool, Clock, AgentGraph, Config) {
        (init_test_db().await.unwrap(), Clock::new_tick(), AgentGraph::new(), Config::default())
    }

    #[tokio::test]
    async fn follow_twice_fails_second_time() {
        let (pool, clock, mut graph, config) = fixture().await;
        store::users::insert_user(&pool, 1, "a", "A", "", "0").await.unwrap();
        store::users::insert_user(&pool, 2, "b", "B", "", "0").await.unwrap();
        let mut ctx = Ctx { pool: &pool, clock: &clock, graph: &mut graph, config: &config };

        follow(&mut ctx, 1, &json!({ "followee_id": 2 })).await.unwrap();
        let err = follow(&mut ctx, 1, &json!({ "followee_id": 2 })).await.unwrap_err();
        assert!(matches!(err, PlatformError::Precondition(_)));
    }

    #[tokio::test]
    async fn follow_self_fails() {
        let (pool, clock, mut graph, config) = fixture().await;
        store::users::insert_user(&pool, 1, "a", "A", "", "0").await.unwrap();
        let mut ctx = Ctx { pool: &pool, clock: &clock, graph: &mut graph, config: &config };

        let err = follow(&mut ctx, 1, &json!({ "followee_id": 1 })).await.unwrap_err();
        assert!(matches!(err, PlatformError::Precondition(_)));
    }

    #[tokio::test]
    async fn follow_then_unfollow_zeroes_counters() {
        let (pool, clock, mut graph, config) = fixture().await;
        let a = store::users::insert_user(&pool, 1, "a", "A", "", "0").await.unwrap();
        let b = store::users::insert_user(&pool, 2, "b", "B", "", "0").await.unwrap();
        let mut ctx = Ctx { pool: &pool, clock: &clock, graph: &mut graph, config: &config };

        follow(&mut ctx, 1, &json!({ "followee_id": b })).await.unwrap();
        unfollow(&mut ctx, 1, &json!({ "followee_id": b })).await.unwrap();

        let user_a = store::users::get_user(&pool, a).await.unwrap().unwrap();
        let user_b = store::users::get_user(&pool, b).await.unwrap().unwrap();
        assert_eq!(user_a.num_followings, 0);
        assert_eq!(user_b.num_followers, 0);
    }

    #[tokio::test]
    async fn follow_updates_agent_graph() {
        let (pool, clock, mut graph, config) = fixture().await;
        let a = store::users::insert_user(&pool, 1, "a", "A", "", "0").await.unwrap();
        let b = store::users::insert_user(&pool, 2, "b", "B", "", "0").await.unwrap();
        graph.add_agent(a, crate::agent_graph::AgentProfile::default());
        graph.add_agent(b, crate::agent_graph::AgentProfile::default());
        let mut ctx = Ctx { pool: &pool, clock: &clock, graph: &mut graph, config: &config };

        follow(&mut ctx, 1, &json!({ "followee_id": b })).await.unwrap();
        assert_eq!(ctx.graph.num_edges(), 1);
    }

    #[tokio::test]
    async fn mute_twice_fails_second_time() {
        let (pool, clock, mut graph, config) = fixture().await;
        store::users::insert_user(&pool, 1, "a", "A", "", "0").await.unwrap();
        let mut ctx = Ctx { pool: &pool, clock: &clock, graph: &mut graph, config: &config };

        mute(&mut ctx, 1, &json!({ "mutee_id": 2 })).await.unwrap();
        let err = mute(&mut ctx, 1, &json!({ "mutee_id": 2 })).await.unwrap_err();
        assert!(matches!(err, PlatformError::Precondition(_)));
    }
}
