//! A deterministic, test-only [`LlmProvider`] that plays back a queue of
//! pre-recorded tool calls instead of talking to a real model. Mirrors
//! [`crate::recsys::embedding::HashEmbeddingProvider`]'s role: something unit
//! and integration tests can drive without network access.

use std::sync::Mutex;

use super::{GenerationParams, LlmProvider, LlmResponse, ToolCall, ToolCompletion, ToolSchema, TokenUsage};
use crate::error::LlmError;

/// Replays a fixed sequence of [`ToolCompletion`]s, one per call to
/// [`ScriptedLlmProvider::complete_with_tools`]. Once exhausted, further
/// calls return an empty completion (the agent does nothing that turn).
pub struct ScriptedLlmProvider {
    script: Mutex<Vec<ToolCompletion>>,
}

impl ScriptedLlmProvider {
    /// Build a provider that plays back `script` in order.
    pub fn new(script: Vec<ToolCompletion>) -> Self {
        Self { script: Mutex::new(script.into_iter().rev().collect()) }
    }

    /// Convenience constructor for a single scripted tool call repeated
    /// every turn until the queue runs out.
    pub fn calling(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self::new(vec![ToolCompletion {
            tool_calls: vec![ToolCall { name: name.into(), arguments }],
            text: None,
            usage: TokenUsage::default(),
        }])
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedLlmProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _system: &str, _user_message: &str, _params: &GenerationParams) -> Result<LlmResponse, LlmError> {
        Ok(LlmResponse {
            text: "scripted response".to_string(),
            usage: TokenUsage::default(),
            model: "scripted".to_string(),
        })
    }

    async fn complete_with_tools(
        &self,
        _system: &str,
        _user_message: &str,
        _tools: &[ToolSchema],
        _params: &GenerationParams,
    ) -> Result<ToolCompletion, LlmError> {
        let mut script = self.script.lock().expect("scripted provider lock poisoned");
        Ok(script.pop().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_in_order_then_goes_empty() {
        let provider = ScriptedLlmProvider::calling("like_post", serde_json::json!({ "post_id": 1 }));
        let first = provider
            .complete_with_tools("s", "u", &[], &GenerationParams::default())
            .await
            .unwrap();
        assert_eq!(first.tool_calls[0].name, "like_post");

        let second = provider
            .complete_with_tools("s", "u", &[], &GenerationParams::default())
            .await
            .unwrap();
        assert!(second.tool_calls.is_empty());
    }
}
