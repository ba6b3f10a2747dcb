//! Platform dispatch table. One free function per handler,
//! grouped by concern; [`dispatch`] maps an `action_tag` to the matching
//! function and wraps its result in a [`crate::channel::Reply`].
//!
//! Every handler follows the same shape: look up the sender's `User` row,
//! validate preconditions, mutate the Store, and return the JSON payload the
//! caller observes. Tracing and the "no trace on failure" rule are applied
//! once, centrally, by [`dispatch`] — individual handlers never write trace
//! rows themselves.

mod accounts;
mod comments;
mod groups;
mod misc;
mod posts;
mod ratings;
mod social;

use serde_json::Value;

use crate::agent_graph::AgentGraph;
use crate::clock::Clock;
use crate::config::Config;
use crate::error::PlatformError;
use crate::store::users::User;
use crate::store::DbPool;

/// Bundles everything a handler needs, borrowed for the duration of one
/// dispatch. Constructed fresh per request by [`crate::platform::Platform`].
pub struct Ctx<'a> {
    pub pool: &'a DbPool,
    pub clock: &'a Clock,
    pub graph: &'a mut AgentGraph,
    pub config: &'a Config,
}

/// Look up the `User` row for `agent_id`, failing if they have not signed up.
pub(super) async fn current_user(ctx: &Ctx<'_>, agent_id: i64) -> Result<User, PlatformError> {
    crate::store::users::get_user_by_agent_id(ctx.pool, agent_id)
        .await?
        .ok_or_else(|| PlatformError::Precondition("agent has not signed up".to_string()))
}

/// Extract the payload as a JSON object, failing for non-object payloads
/// (every handler except the zero-argument ones expects one).
pub(super) fn as_object(payload: &Value) -> Result<&serde_json::Map<String, Value>, PlatformError> {
    payload
        .as_object()
        .ok_or_else(|| PlatformError::Precondition("expected an object payload".to_string()))
}

/// Required string argument.
pub(super) fn arg_str(map: &serde_json::Map<String, Value>, key: &str) -> Result<String, PlatformError> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| PlatformError::Precondition(format!("missing or invalid argument '{key}'")))
}

/// Optional string argument.
pub(super) fn arg_opt_str(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Required integer argument.
pub(super) fn arg_i64(map: &serde_json::Map<String, Value>, key: &str) -> Result<i64, PlatformError> {
    map.get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| PlatformError::Precondition(format!("missing or invalid argument '{key}'")))
}

/// Optional integer argument.
pub(super) fn arg_opt_i64(map: &serde_json::Map<String, Value>, key: &str) -> Option<i64> {
    map.get(key).and_then(Value::as_i64)
}

/// The outcome of a dispatched handler: its JSON result plus whether a
/// trace row should be written (state-changing success only).
pub struct Outcome {
    pub data: Value,
    pub trace_action: Option<&'static str>,
    pub trace_info: Option<Value>,
}

impl Outcome {
    fn traced(data: Value, action: &'static str, info: Value) -> Self {
        Outcome {
            data,
            trace_action: Some(action),
            trace_info: Some(info),
        }
    }

    fn untraced(data: Value) -> Self {
        Outcome {
            data,
            trace_action: None,
            trace_info: None,
        }
    }
}

/// Dispatch one request to its handler. Returns `Err` for precondition or
/// internal failures (the caller turns this into a failing [`crate::channel::Reply`]
/// and writes no trace row).
pub async fn dispatch(
    ctx: &mut Ctx<'_>,
    agent_id: i64,
    action_tag: &str,
    payload: &Value,
) -> Result<Outcome, PlatformError> {
    match action_tag {
        "sign_up" => accounts::sign_up(ctx, agent_id, payload).await,
        "sign_up_product" => accounts::sign_up_product(ctx, payload).await,
        "purchase_product" => accounts::purchase_product(ctx, payload).await,

        "refresh" => posts::refresh(ctx, agent_id).await,
        "create_post" => posts::create_post(ctx, agent_id, payload).await,
        "repost" => posts::repost(ctx, agent_id, payload).await,
        "quote_post" => posts::quote_post(ctx, agent_id, payload).await,
        "search_posts" => posts::search_posts(ctx, payload).await,
        "trend" => posts::trend(ctx).await,

        "like_post" => ratings::like_post(ctx, agent_id, payload).await,
        "unlike_post" => ratings::unlike_post(ctx, agent_id, payload).await,
        "dislike_post" => ratings::dislike_post(ctx, agent_id, payload).await,
        "undo_dislike_post" => ratings::undo_dislike_post(ctx, agent_id, payload).await,
        "like_comment" => ratings::like_comment(ctx, agent_id, payload).await,
        "unlike_comment" => ratings::unlike_comment(ctx, agent_id, payload).await,
        "dislike_comment" => ratings::dislike_comment(ctx, agent_id, payload).await,
        "undo_dislike_comment" => ratings::undo_dislike_comment(ctx, agent_id, payload).await,
        "report_post" => ratings::report_post(ctx, agent_id, payload).await,

        "follow" => social::follow(ctx, agent_id, payload).await,
        "unfollow" => social::unfollow(ctx, agent_id, payload).await,
        "mute" => social::mute(ctx, agent_id, payload).await,
        "unmute" => social::unmute(ctx, agent_id, payload).await,
        "search_user" => social::search_user(ctx, payload).await,

        "create_comment" => comments::create_comment(ctx, agent_id, payload).await,

        "create_group" => groups::create_group(ctx, payload).await,
        "join_group" => groups::join_group(ctx, agent_id, payload).await,
        "leave_group" => groups::leave_group(ctx, agent_id, payload).await,
        "send_to_group" => groups::send_to_group(ctx, agent_id, payload).await,
        "listen_from_group" => groups::listen_from_group(ctx, agent_id).await,

        "do_nothing" => misc::do_nothing(),
        "interview" => misc::interview(ctx, agent_id, payload).await,

        other => Err(PlatformError::Precondition(format!(
            "unknown action tag '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_object_rejects_non_object_payload() {
        let err = as_object(&Value::Null).unwrap_err();
        assert!(matches!(err, PlatformError::Precondition(_)));
    }

    #[test]
    fn arg_str_rejects_missing_key() {
        let map = serde_json::Map::new();
        let err = arg_str(&map, "content").unwrap_err();
        assert!(matches!(err, PlatformError::Precondition(_)));
    }
}
