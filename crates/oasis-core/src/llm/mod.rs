//! LLM provider abstraction: a black-box tool-calling text
//! completion service. The Platform never touches this module directly —
//! only [`crate::agent::Agent`] and the `interview` manual action do.

pub mod openai_compat;
pub mod scripted;

use serde_json::Value;

use crate::error::LlmError;

/// Token usage information from an LLM completion.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Parameters controlling LLM generation behavior.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.7,
        }
    }
}

/// A plain-text completion, used only by the `interview` one-shot call,
/// whose reply is attached to the same trace row as the prompt.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub usage: TokenUsage,
    pub model: String,
}

/// A tool the Agent is permitted to call this turn, derived from its
/// permitted-action set (`interview` is always excluded).
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema object describing the handler's payload arguments.
    pub parameters: Value,
}

/// One tool invocation chosen by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Value,
}

/// The result of a tool-calling turn: zero or more tool calls plus any
/// accompanying free text (a model may "think out loud" and call no tools,
/// which the Agent treats as a no-op turn).
#[derive(Debug, Clone, Default)]
pub struct ToolCompletion {
    pub tool_calls: Vec<ToolCall>,
    pub text: Option<String>,
    pub usage: TokenUsage,
}

/// Trait abstracting all LLM provider operations used by the simulation.
///
/// Object-safe for use as `Arc<dyn LlmProvider>`, mirroring
/// [`crate::recsys::embedding::EmbeddingProvider`].
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Display name of this provider (e.g. `"openai"`, `"anthropic"`).
    fn name(&self) -> &str;

    /// Plain-text completion, used by the `interview` manual action.
    async fn complete(&self, system: &str, user_message: &str, params: &GenerationParams) -> Result<LlmResponse, LlmError>;

    /// Tool-calling completion, used by `Agent::act_by_llm`. `tools` is the
    /// schema list for the agent's permitted actions (never includes
    /// `interview`).
    async fn complete_with_tools(
        &self,
        system: &str,
        user_message: &str,
        tools: &[ToolSchema],
        params: &GenerationParams,
    ) -> Result<ToolCompletion, LlmError>;
}
