//! End-to-end scenarios driven entirely through the public Channel/Platform
//! surface, each spanning more than one handler in the order an
//! Environment Driver would actually issue them. Unlike the per-handler
//! `#[cfg(test)]` modules colocated with `platform::handlers`, these drive
//! the whole stack: Channel -> Platform::run -> handler -> Store, against
//! an ephemeral in-memory database opened the same way a real run would.

use oasis_core::config::{Config, RecsysType};
use oasis_core::recsys::embedding::HashEmbeddingProvider;
use oasis_core::{channel, Platform};
use serde_json::json;
use std::sync::Arc;

async fn spawn_platform(config: Config) -> (oasis_core::ChannelSender, tokio::task::JoinHandle<()>) {
    let platform = Platform::new(config, Arc::new(HashEmbeddingProvider::default()))
        .await
        .expect("in-memory platform opens");
    let (tx, rx) = channel();
    let handle = tokio::spawn(platform.run(rx));
    (tx, handle)
}

fn memory_config() -> Config {
    let mut config = Config::default();
    config.storage.db_path = ":memory:".to_string();
    config
}

#[tokio::test]
async fn self_like_is_rejected_unless_allow_self_rating_is_set() {
    let (tx, handle) = spawn_platform(memory_config()).await;

    tx.call(1, "sign_up", json!({ "handle": "a", "display_name": "A", "bio": "" }))
        .await
        .unwrap();
    let post_id = tx
        .call(1, "create_post", json!({ "content": "hello" }))
        .await
        .unwrap()
        .data["post_id"]
        .clone();

    let reply = tx.call(1, "like_post", json!({ "post_id": post_id })).await.unwrap();
    assert!(!reply.success);
    assert_eq!(reply.error.as_deref(), Some("cannot rate own post"));

    tx.close();
    handle.await.unwrap();
}

#[tokio::test]
async fn liking_a_repost_credits_the_canonical_root() {
    let (tx, handle) = spawn_platform(memory_config()).await;

    tx.call(1, "sign_up", json!({ "handle": "author", "display_name": "Author", "bio": "" }))
        .await
        .unwrap();
    tx.call(2, "sign_up", json!({ "handle": "reposter", "display_name": "Reposter", "bio": "" }))
        .await
        .unwrap();
    tx.call(3, "sign_up", json!({ "handle": "liker", "display_name": "Liker", "bio": "" }))
        .await
        .unwrap();

    let root_id = tx.call(1, "create_post", json!({ "content": "original" })).await.unwrap().data["post_id"].clone();
    let repost_id = tx.call(2, "repost", json!({ "post_id": root_id })).await.unwrap().data["post_id"].clone();
    assert_ne!(root_id, repost_id);

    let reply = tx.call(3, "like_post", json!({ "post_id": repost_id })).await.unwrap();
    assert!(reply.success);

    // The search listing surfaces the root post's like count, not a
    // separate count on the repost row.
    let found = tx.call(3, "search_posts", json!({ "query": "original" })).await.unwrap();
    let posts = found.data.as_array().unwrap();
    let root = posts.iter().find(|p| p["id"] == root_id).unwrap();
    assert_eq!(root["num_likes"], 1);

    tx.close();
    handle.await.unwrap();
}

#[tokio::test]
async fn follow_then_unfollow_round_trips_counters_to_zero() {
    let (tx, handle) = spawn_platform(memory_config()).await;

    let a = tx.call(1, "sign_up", json!({ "handle": "a", "display_name": "A", "bio": "" })).await.unwrap().data["user_id"].clone();
    let b = tx.call(2, "sign_up", json!({ "handle": "b", "display_name": "B", "bio": "" })).await.unwrap().data["user_id"].clone();

    let follow_reply = tx.call(1, "follow", json!({ "followee_id": b })).await.unwrap();
    assert!(follow_reply.success);

    let searched = tx.call(1, "search_user", json!({ "query": "b" })).await.unwrap();
    let users = searched.data.as_array().unwrap();
    let followee = users.iter().find(|u| u["id"] == b).unwrap();
    assert_eq!(followee["num_followers"], 1);

    let unfollow_reply = tx.call(1, "unfollow", json!({ "followee_id": b })).await.unwrap();
    assert!(unfollow_reply.success);

    let searched = tx.call(1, "search_user", json!({ "query": "a" })).await.unwrap();
    let users = searched.data.as_array().unwrap();
    let follower = users.iter().find(|u| u["id"] == a).unwrap();
    assert_eq!(follower["num_followings"], 0);

    tx.close();
    handle.await.unwrap();
}

#[tokio::test]
async fn group_messaging_requires_current_membership() {
    let (tx, handle) = spawn_platform(memory_config()).await;

    tx.call(1, "sign_up", json!({ "handle": "a", "display_name": "A", "bio": "" })).await.unwrap();
    tx.call(2, "sign_up", json!({ "handle": "b", "display_name": "B", "bio": "" })).await.unwrap();

    let group_id = tx.call(1, "create_group", json!({ "name": "rustaceans" })).await.unwrap().data["group_id"].clone();
    tx.call(1, "join_group", json!({ "group_id": group_id })).await.unwrap();
    tx.call(2, "join_group", json!({ "group_id": group_id })).await.unwrap();

    tx.call(1, "send_to_group", json!({ "group_id": group_id, "text": "welcome" })).await.unwrap();
    tx.call(2, "leave_group", json!({ "group_id": group_id })).await.unwrap();

    let rejected = tx.call(2, "send_to_group", json!({ "group_id": group_id, "text": "too late" })).await.unwrap();
    assert!(!rejected.success);

    let heard = tx.call(1, "listen_from_group", json!(null)).await.unwrap();
    assert_eq!(heard.data.as_array().unwrap().len(), 1);

    tx.close();
    handle.await.unwrap();
}

#[tokio::test]
async fn interview_appends_response_on_the_same_trace_row_never_a_new_one() {
    let (tx, handle) = spawn_platform(memory_config()).await;
    tx.call(1, "sign_up", json!({ "handle": "a", "display_name": "A", "bio": "" })).await.unwrap();

    let prompt_reply = tx.call(1, "interview", json!({ "prompt": "what did you do today?" })).await.unwrap();
    let trace_id = prompt_reply.data["trace_id"].clone();

    let fill_reply = tx
        .call(1, "interview", json!({ "trace_id": trace_id, "response": "read a book" }))
        .await
        .unwrap();
    assert_eq!(fill_reply.data["trace_id"], trace_id);

    tx.close();
    handle.await.unwrap();
}

#[tokio::test]
async fn reddit_strategy_gives_every_user_the_identical_hot_scored_slate() {
    let mut config = memory_config();
    config.recsys_type = RecsysType::Reddit;
    config.max_rec_post_len = 1;
    let (tx, handle) = spawn_platform(config).await;

    tx.call(1, "sign_up", json!({ "handle": "a", "display_name": "A", "bio": "" })).await.unwrap();
    tx.call(2, "sign_up", json!({ "handle": "b", "display_name": "B", "bio": "" })).await.unwrap();

    let _low_id = tx.call(1, "create_post", json!({ "content": "quiet post" })).await.unwrap().data["post_id"].clone();
    let high_id = tx.call(2, "create_post", json!({ "content": "popular post" })).await.unwrap().data["post_id"].clone();
    tx.call(1, "like_post", json!({ "post_id": high_id })).await.unwrap();

    // Enough posts to force the engine off the "degenerate to full set" path.
    tx.call(1, "create_post", json!({ "content": "filler one" })).await.unwrap();
    tx.call(2, "create_post", json!({ "content": "filler two" })).await.unwrap();

    tx.call(-1, "update_rec_table", json!(null)).await.unwrap();

    let refresh_one = tx.call(1, "refresh", json!(null)).await.unwrap();
    let refresh_two = tx.call(2, "refresh", json!(null)).await.unwrap();
    assert_eq!(refresh_one.data, refresh_two.data);

    tx.close();
    handle.await.unwrap();
}
