//! `like_post`, `unlike_post`, `dislike_post`, `undo_dislike_post`,
//! `like_comment`, `unlike_comment`, `dislike_comment`,
//! `undo_dislike_comment`, `report_post`.
//!
//! Likes and dislikes are kept mutually exclusive per `(user, target)` by
//! workflow, not by a schema constraint: liking a target the
//! caller has disliked clears the dislike first, and vice versa.

use serde_json::{json, Value};

use crate::error::PlatformError;
use crate::store;
use crate::store::ratings::Target;

use super::{arg_i64, arg_str, as_object, current_user, Ctx, Outcome};

/// Fail if self-rating is disabled and `rater_id` owns the target.
fn check_self_rating(ctx: &Ctx<'_>, rater_id: i64, owner_id: i64) -> Result<(), PlatformError> {
    if !ctx.config.allow_self_rating && rater_id == owner_id {
        return Err(PlatformError::Precondition(
            "cannot rate own post".to_string(),
        ));
    }
    Ok(())
}

async fn canonical_post(ctx: &Ctx<'_>, post_id: i64) -> Result<store::posts::Post, PlatformError> {
    let root_id = store::posts::canonicalize(ctx.pool, post_id)
        .await?
        .ok_or_else(|| PlatformError::Precondition(format!("no such post {post_id}")))?;
    store::posts::get_post(ctx.pool, root_id)
        .await?
        .ok_or_else(|| PlatformError::Precondition(format!("no such post {root_id}")))
}

/// `like_post[post_id]` → canonicalizes to root, enforces uniqueness,
/// clears any existing dislike, maintains `num_likes`.
pub async fn like_post(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let map = as_object(payload)?;
    let target_id = arg_i64(map, "post_id")?;
    let post = canonical_post(ctx, target_id).await?;
    check_self_rating(ctx, user.id, post.user_id)?;

    if !store::ratings::insert_like(ctx.pool, Target::Post, user.id, post.id, &ctx.clock.now()).await? {
        return Err(PlatformError::Precondition("already liked this post".to_string()));
    }
    if store::ratings::delete_dislike(ctx.pool, Target::Post, user.id, post.id).await? {
        store::posts::adjust_num_dislikes(ctx.pool, post.id, -1).await?;
    }
    store::posts::adjust_num_likes(ctx.pool, post.id, 1).await?;

    Ok(Outcome::traced(
        json!({ "post_id": post.id }),
        "like_post",
        json!({ "post_id": post.id }),
    ))
}

/// `unlike_post[post_id]` — fails if no matching like exists.
pub async fn unlike_post(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let map = as_object(payload)?;
    let target_id = arg_i64(map, "post_id")?;
    let post = canonical_post(ctx, target_id).await?;

    if !store::ratings::delete_like(ctx.pool, Target::Post, user.id, post.id).await? {
        return Err(PlatformError::Precondition("post is not liked".to_string()));
    }
    store::posts::adjust_num_likes(ctx.pool, post.id, -1).await?;

    Ok(Outcome::traced(
        json!({ "post_id": post.id }),
        "unlike_post",
        json!({ "post_id": post.id }),
    ))
}

/// `dislike_post[post_id]` — mirrors `like_post` for dislikes.
pub async fn dislike_post(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let map = as_object(payload)?;
    let target_id = arg_i64(map, "post_id")?;
    let post = canonical_post(ctx, target_id).await?;
    check_self_rating(ctx, user.id, post.user_id)?;

    if !store::ratings::insert_dislike(ctx.pool, Target::Post, user.id, post.id, &ctx.clock.now()).await? {
        return Err(PlatformError::Precondition("already disliked this post".to_string()));
    }
    if store::ratings::delete_like(ctx.pool, Target::Post, user.id, post.id).await? {
        store::posts::adjust_num_likes(ctx.pool, post.id, -1).await?;
    }
    store::posts::adjust_num_dislikes(ctx.pool, post.id, 1).await?;

    Ok(Outcome::traced(
        json!({ "post_id": post.id }),
        "dislike_post",
        json!({ "post_id": post.id }),
    ))
}

/// `undo_dislike_post[post_id]` — fails if no matching dislike exists.
pub async fn undo_dislike_post(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let map = as_object(payload)?;
    let target_id = arg_i64(map, "post_id")?;
    let post = canonical_post(ctx, target_id).await?;

    if !store::ratings::delete_dislike(ctx.pool, Target::Post, user.id, post.id).await? {
        return Err(PlatformError::Precondition("post is not disliked".to_string()));
    }
    store::posts::adjust_num_dislikes(ctx.pool, post.id, -1).await?;

    Ok(Outcome::traced(
        json!({ "post_id": post.id }),
        "undo_dislike_post",
        json!({ "post_id": post.id }),
    ))
}

/// `like_comment[comment_id]` — mirrors `like_post`, no canonicalization
/// (comments address a fixed, already-canonicalized post).
pub async fn like_comment(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let map = as_object(payload)?;
    let comment_id = arg_i64(map, "comment_id")?;
    let comment = store::comments::get_comment(ctx.pool, comment_id)
        .await?
        .ok_or_else(|| PlatformError::Precondition(format!("no such comment {comment_id}")))?;
    check_self_rating(ctx, user.id, comment.user_id)?;

    if !store::ratings::insert_like(ctx.pool, Target::Comment, user.id, comment.id, &ctx.clock.now()).await? {
        return Err(PlatformError::Precondition("already liked this comment".to_string()));
    }
    if store::ratings::delete_dislike(ctx.pool, Target::Comment, user.id, comment.id).await? {
        store::comments::adjust_num_dislikes(ctx.pool, comment.id, -1).await?;
    }
    store::comments::adjust_num_likes(ctx.pool, comment.id, 1).await?;

    Ok(Outcome::traced(
        json!({ "comment_id": comment.id }),
        "like_comment",
        json!({ "comment_id": comment.id }),
    ))
}

/// `unlike_comment[comment_id]` — fails if no matching like exists.
pub async fn unlike_comment(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let map = as_object(payload)?;
    let comment_id = arg_i64(map, "comment_id")?;

    if !store::ratings::delete_like(ctx.pool, Target::Comment, user.id, comment_id).await? {
        return Err(PlatformError::Precondition("comment is not liked".to_string()));
    }
    store::comments::adjust_num_likes(ctx.pool, comment_id, -1).await?;

    Ok(Outcome::traced(
        json!({ "comment_id": comment_id }),
        "unlike_comment",
        json!({ "comment_id": comment_id }),
    ))
}

/// `dislike_comment[comment_id]` — mirrors `dislike_post`.
pub async fn dislike_comment(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let map = as_object(payload)?;
    let comment_id = arg_i64(map, "comment_id")?;
    let comment = store::comments::get_comment(ctx.pool, comment_id)
        .await?
        .ok_or_else(|| PlatformError::Precondition(format!("no such comment {comment_id}")))?;
    check_self_rating(ctx, user.id, comment.user_id)?;

    if !store::ratings::insert_dislike(ctx.pool, Target::Comment, user.id, comment.id, &ctx.clock.now()).await? {
        return Err(PlatformError::Precondition("already disliked this comment".to_string()));
    }
    if store::ratings::delete_like(ctx.pool, Target::Comment, user.id, comment.id).await? {
        store::comments::adjust_num_likes(ctx.pool, comment.id, -1).await?;
    }
    store::comments::adjust_num_dislikes(ctx.pool, comment.id, 1).await?;

    Ok(Outcome::traced(
        json!({ "comment_id": comment.id }),
        "dislike_comment",
        json!({ "comment_id": comment.id }),
    ))
}

/// `undo_dislike_comment[comment_id]` — fails if no matching dislike exists.
pub async fn undo_dislike_comment(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let map = as_object(payload)?;
    let comment_id = arg_i64(map, "comment_id")?;

    if !store::ratings::delete_dislike(ctx.pool, Target::Comment, user.id, comment_id).await? {
        return Err(PlatformError::Precondition("comment is not disliked".to_string()));
    }
    store::comments::adjust_num_dislikes(ctx.pool, comment_id, -1).await?;

    Ok(Outcome::traced(
        json!({ "comment_id": comment_id }),
        "undo_dislike_comment",
        json!({ "comment_id": comment_id }),
    ))
}

/// `report_post[post_id, reason]` — canonicalizes, increments `num_reports`,
/// unique per `(reporter, post)`.
pub async fn report_post(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let map = as_object(payload)?;
    let target_id = arg_i64(map, "post_id")?;
    let reason = arg_str(map, "reason")?;
    let post = canonical_post(ctx, target_id).await?;

    if !store::reports::insert_report(ctx.pool, user.id, post.id, &reason, &ctx.clock.now()).await? {
        return Err(PlatformError::Precondition("already reported this post".to_string()));
    }
    store::posts::adjust_num_reports(ctx.pool, post.id, 1).await?;

    Ok(Outcome::traced(
        json!({ "post_id": post.id }),
        "report_post",
        json!({ "post_id": post.id, "reason": reason }),
    ))
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
    async fn like_own_post_fails_when_self_rating_disabled() {
        let (pool, clock, mut graph, mut config) = fixture().await;
        config.allow_self_rating = false;
        let author = store::users::insert_user(&pool, 1, "a", "A", "", "0").await.unwrap();
        let post_id = store::posts::insert_common_post(&pool, author, "hi", "0").await.unwrap();
        let mut ctx = Ctx { pool: &pool, clock: &clock, graph: &mut graph, config: &config };

        let err = like_post(&mut ctx, 1, &json!({ "post_id": post_id })).await.unwrap_err();
        assert!(matches!(err, PlatformError::Precondition(ref m) if m == "cannot rate own post"));
    }

    #[tokio::test]
    async fn like_then_other_user_like_increments_count() {
        let (pool, clock, mut graph, config) = fixture().await;
        let author = store::users::insert_user(&pool, 1, "a", "A", "", "0").await.unwrap();
        store::users::insert_user(&pool, 2, "b", "B", "", "0").await.unwrap();
        let post_id = store::posts::insert_common_post(&pool, author, "hi", "0").await.unwrap();
        let mut ctx = Ctx { pool: &pool, clock: &clock, graph: &mut graph, config: &config };

        like_post(&mut ctx, 2, &json!({ "post_id": post_id })).await.unwrap();
        let post = store::posts::get_post(&pool, post_id).await.unwrap().unwrap();
        assert_eq!(post.num_likes, 1);
    }

    #[tokio::test]
    async fn like_canonicalizes_repost_to_root() {
        let (pool, clock, mut graph, config) = fixture().await;
        let author = store::users::insert_user(&pool, 1, "a", "A", "", "0").await.unwrap();
        let reposter = store::users::insert_user(&pool, 2, "b", "B", "", "0").await.unwrap();
        store::users::insert_user(&pool, 3, "c", "C", "", "0").await.unwrap();
        let root = store::posts::insert_common_post(&pool, author, "hi", "0").await.unwrap();
        let repost_id = store::posts::insert_repost(&pool, reposter, root, "1").await.unwrap();
        let mut ctx = Ctx { pool: &pool, clock: &clock, graph: &mut graph, config: &config };

        like_post(&mut ctx, 3, &json!({ "post_id": repost_id })).await.unwrap();
        let root_post = store::posts::get_post(&pool, root).await.unwrap().unwrap();
        let repost_post = store::posts::get_post(&pool, repost_id).await.unwrap().unwrap();
        assert_eq!(root_post.num_likes, 1);
        assert_eq!(repost_post.num_likes, 0);
    }

    #[tokio::test]
    async fn like_clears_existing_dislike() {
        let (pool, clock, mut graph, mut config) = fixture().await;
        config.allow_self_rating = true;
        let author = store::users::insert_user(&pool, 1, "a", "A", "", "0").await.unwrap();
        let post_id = store::posts::insert_common_post(&pool, author, "hi", "0").await.unwrap();
        let mut ctx = Ctx { pool: &pool, clock: &clock, graph: &mut graph, config: &config };

        dislike_post(&mut ctx, 1, &json!({ "post_id": post_id })).await.unwrap();
        like_post(&mut ctx, 1, &json!({ "post_id": post_id })).await.unwrap();

        let post = store::posts::get_post(&pool, post_id).await.unwrap().unwrap();
        assert_eq!(post.num_likes, 1);
        assert_eq!(post.num_dislikes, 0);
    }

    #[tokio::test]
    async fn unlike_without_like_fails() {
        let (pool, clock, mut graph, config) = fixture().await;
        let author = store::users::insert_user(&pool, 1, "a", "A", "", "0").await.unwrap();
        store::users::insert_user(&pool, 2, "b", "B", "", "0").await.unwrap();
        let post_id = store::posts::insert_common_post(&pool, author, "hi", "0").await.unwrap();
        let mut ctx = Ctx { pool: &pool, clock: &clock, graph: &mut graph, config: &config };

        let err = unlike_post(&mut ctx, 2, &json!({ "post_id": post_id })).await.unwrap_err();
        assert!(matches!(err, PlatformError::Precondition(_)));
    }

    #[tokio::test]
    async fn report_post_twice_fails_second_time() {
        let (pool, clock, mut graph, config) = fixture().await;
        let author = store::users::insert_user(&pool, 1, "a", "A", "", "0").await.unwrap();
        store::users::insert_user(&pool, 2, "b", "B", "", "0").await.unwrap();
        let post_id = store::posts::insert_common_post(&pool, author, "hi", "0").await.unwrap();
        let mut ctx = Ctx { pool: &pool, clock: &clock, graph: &mut graph, config: &config };

        let payload = json!({ "post_id": post_id, "reason": "spam" });
        report_post(&mut ctx, 2, &payload).await.unwrap();
        let err = report_post(&mut ctx, 2, &payload).await.unwrap_err();
        assert!(matches!(err, PlatformError::Precondition(_)));
    }
}
