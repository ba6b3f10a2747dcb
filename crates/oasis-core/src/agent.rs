//! User-space agent actor.
//!
//! An Agent wraps an LLM client, a local view of the social environment
//! (obtained fresh each turn via the Channel, never shared memory — Agents
//! and the Platform share no memory), and the set of tool
//! tags it's permitted to invoke this run. Agents and the Platform run on
//! separate tasks; the only thing that crosses between them is a
//! [`crate::channel::Request`]/[`crate::channel::Reply`] pair.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::agent_graph::AgentProfile;
use crate::channel::ChannelSender;
use crate::error::LlmError;
use crate::llm::{GenerationParams, LlmProvider, ToolCall, ToolSchema};

/// Action tags that are never offered to the LLM even when listed in
/// `permitted_actions` — `interview` is an external control action, never
/// an LLM-chosen tool.
const NEVER_LLM_TOOLS: &[&str] = &["interview", "exit"];

/// A simulation participant driving Channel requests from its own task.
pub struct Agent {
    pub agent_id: i64,
    pub profile: AgentProfile,
    pub permitted_actions: Vec<String>,
    channel: ChannelSender,
    llm: Arc<dyn LlmProvider>,
}

impl Agent {
    pub fn new(agent_id: i64, profile: AgentProfile, permitted_actions: Vec<String>, channel: ChannelSender, llm: Arc<dyn LlmProvider>) -> Self {
        Agent {
            agent_id,
            profile,
            permitted_actions,
            channel,
            llm,
        }
    }

    /// Build an environment prompt (`refresh` + `listen_from_group`), hand
    /// it to the LLM backend along with the tool schemas for this agent's
    /// permitted actions, and dispatch whatever tool calls come back.
    ///
    /// Returns the tool calls that were actually dispatched (successfully
    /// or not — an LLM failure is logged and the turn returns without
    /// dispatching anything; a handler failure is logged per call).
    /// Cancellation is cooperative: a cancelled `cancel` abandons whatever
    /// step the agent is mid-way through and returns the calls dispatched
    /// so far.
    pub async fn act_by_llm(&self, cancel: &CancellationToken) -> Vec<ToolCall> {
        let refresh = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Vec::new(),
            reply = self.channel.call(self.agent_id, "refresh", Value::Null) => reply,
        };
        let refresh = match refresh {
            Ok(reply) if reply.success => reply.data,
            Ok(reply) => {
                debug!(agent_id = self.agent_id, error = ?reply.error, "refresh failed, skipping turn");
                return Vec::new();
            }
            Err(e) => {
                warn!(agent_id = self.agent_id, error = %e, "refresh channel call failed");
                return Vec::new();
            }
        };

        let messages = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Vec::new(),
            reply = self.channel.call(self.agent_id, "listen_from_group", Value::Null) => reply,
        };
        let messages = messages.ok().map(|r| r.data).unwrap_or(Value::Null);

        let system = self.system_prompt();
        let user_message = json!({ "feed": refresh, "group_messages": messages }).to_string();
        let tools = self.tool_schemas();

        let completion = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Vec::new(),
            c = self.llm.complete_with_tools(&system, &user_message, &tools, &GenerationParams::default()) => c,
        };
        let completion = match completion {
            Ok(c) => c,
            Err(e) => {
                warn!(agent_id = self.agent_id, error = %e, "LLM call failed, skipping turn");
                return Vec::new();
            }
        };

        let mut dispatched = Vec::with_capacity(completion.tool_calls.len());
        for call in completion.tool_calls {
            if cancel.is_cancelled() {
                break;
            }
            if NEVER_LLM_TOOLS.contains(&call.name.as_str()) {
                warn!(agent_id = self.agent_id, action = %call.name, "LLM attempted to call a non-advertised tool, ignoring");
                continue;
            }

            let reply = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                r = self.channel.call(self.agent_id, call.name.clone(), call.arguments.clone()) => r,
            };
            match reply {
                Ok(reply) if reply.success => dispatched.push(call),
                Ok(reply) => debug!(agent_id = self.agent_id, action = %call.name, error = ?reply.error, "tool call rejected"),
                Err(e) => warn!(agent_id = self.agent_id, action = %call.name, error = %e, "tool call channel failure"),
            }
        }
        dispatched
    }

    /// `act-by-manual[action, args]` — dispatch exactly one named action,
    /// bypassing the LLM entirely. Used by the Driver for
    /// scripted interventions and for `interview`.
    pub async fn act_by_manual(&self, action: &str, args: Value) -> Result<Value, LlmError> {
        match self.channel.call(self.agent_id, action, args).await {
            Ok(reply) if reply.success => Ok(reply.data),
            Ok(reply) => Err(LlmError::Parse(reply.error.unwrap_or_else(|| "handler rejected action".to_string()))),
            Err(_) => Err(LlmError::Cancelled),
        }
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are {} (@{}). {}\nChoose zero or more tool calls in response to your feed and group messages. \
             You may also choose to do nothing.",
            self.profile.display_name, self.profile.handle, self.profile.bio,
        )
    }

    fn tool_schemas(&self) -> Vec<ToolSchema> {
        self.permitted_actions
            .iter()
            .filter(|tag| !NEVER_LLM_TOOLS.contains(&tag.as_str()))
            .filter_map(|tag| tool_schema_for(tag))
            .collect()
    }
}

/// Hand-written JSON Schema for each advertisable action tag's payload;
/// argument names follow the handlers in [`crate::platform::handlers`].
fn tool_schema_for(action_tag: &str) -> Option<ToolSchema> {
    let (description, parameters) = match action_tag {
        "create_post" => (
            "Publish a new top-level post.",
            json!({ "type": "object", "properties": { "content": { "type": "string" } }, "required": ["content"] }),
        ),
        "repost" => (
            "Reshare an existing post under your own account.",
            json!({ "type": "object", "properties": { "post_id": { "type": "integer" } }, "required": ["post_id"] }),
        ),
        "quote_post" => (
            "Reshare an existing post with your own added commentary.",
            json!({
                "type": "object",
                "properties": { "post_id": { "type": "integer" }, "quote_content": { "type": "string" } },
                "required": ["post_id", "quote_content"],
            }),
        ),
        "search_posts" => (
            "Search posts by a substring of their content.",
            json!({ "type": "object", "properties": { "query": { "type": "string" } }, "required": ["query"] }),
        ),
        "trend" => ("List today's trending posts.", json!({ "type": "object", "properties": {} })),
        "like_post" => (
            "Like a post.",
            json!({ "type": "object", "properties": { "post_id": { "type": "integer" } }, "required": ["post_id"] }),
        ),
        "unlike_post" => (
            "Remove your like from a post.",
            json!({ "type": "object", "properties": { "post_id": { "type": "integer" } }, "required": ["post_id"] }),
        ),
        "dislike_post" => (
            "Dislike a post.",
            json!({ "type": "object", "properties": { "post_id": { "type": "integer" } }, "required": ["post_id"] }),
        ),
        "undo_dislike_post" => (
            "Remove your dislike from a post.",
            json!({ "type": "object", "properties": { "post_id": { "type": "integer" } }, "required": ["post_id"] }),
        ),
        "like_comment" => (
            "Like a comment.",
            json!({ "type": "object", "properties": { "comment_id": { "type": "integer" } }, "required": ["comment_id"] }),
        ),
        "unlike_comment" => (
            "Remove your like from a comment.",
            json!({ "type": "object", "properties": { "comment_id": { "type": "integer" } }, "required": ["comment_id"] }),
        ),
        "dislike_comment" => (
            "Dislike a comment.",
            json!({ "type": "object", "properties": { "comment_id": { "type": "integer" } }, "required": ["comment_id"] }),
        ),
        "undo_dislike_comment" => (
            "Remove your dislike from a comment.",
            json!({ "type": "object", "properties": { "comment_id": { "type": "integer" } }, "required": ["comment_id"] }),
        ),
        "report_post" => (
            "Report a post for moderation.",
            json!({
                "type": "object",
                "properties": { "post_id": { "type": "integer" }, "reason": { "type": "string" } },
                "required": ["post_id", "reason"],
            }),
        ),
        "follow" => (
            "Follow another user.",
            json!({ "type": "object", "properties": { "followee_id": { "type": "integer" } }, "required": ["followee_id"] }),
        ),
        "unfollow" => (
            "Unfollow a user you currently follow.",
            json!({ "type": "object", "properties": { "followee_id": { "type": "integer" } }, "required": ["followee_id"] }),
        ),
        "mute" => (
            "Mute another user.",
            json!({ "type": "object", "properties": { "mutee_id": { "type": "integer" } }, "required": ["mutee_id"] }),
        ),
        "unmute" => (
            "Unmute a user you currently mute.",
            json!({ "type": "object", "properties": { "mutee_id": { "type": "integer" } }, "required": ["mutee_id"] }),
        ),
        "search_user" => (
            "Search users by a substring of their handle or display name.",
            json!({ "type": "object", "properties": { "query": { "type": "string" } }, "required": ["query"] }),
        ),
        "create_comment" => (
            "Comment on a post.",
            json!({
                "type": "object",
                "properties": { "post_id": { "type": "integer" }, "content": { "type": "string" } },
                "required": ["post_id", "content"],
            }),
        ),
        "create_group" => (
            "Create a new group chat.",
            json!({ "type": "object", "properties": { "name": { "type": "string" } }, "required": ["name"] }),
        ),
        "join_group" => (
            "Join an existing group chat.",
            json!({ "type": "object", "properties": { "group_id": { "type": "integer" } }, "required": ["group_id"] }),
        ),
        "leave_group" => (
            "Leave a group chat you belong to.",
            json!({ "type": "object", "properties": { "group_id": { "type": "integer" } }, "required": ["group_id"] }),
        ),
        "send_to_group" => (
            "Send a message to a group chat you belong to.",
            json!({
                "type": "object",
                "properties": { "group_id": { "type": "integer" }, "text": { "type": "string" } },
                "required": ["group_id", "text"],
            }),
        ),
        "do_nothing" => ("Take no action this turn.", json!({ "type": "object", "properties": {} })),
        _ => return None,
    };
    Some(ToolSchema {
        name: action_tag.to_string(),
        description: description.to_string(),
        parameters,
    })
}
