//! OpenAI-compatible tool-calling provider. Works with OpenAI and any
//! Ollama-style endpoint that speaks the chat-completions + function-calling
//! request/response shape.

use serde::{Deserialize, Serialize};

use super::{GenerationParams, LlmProvider, LlmResponse, ToolCall, ToolCompletion, ToolSchema, TokenUsage};
use crate::error::LlmError;

pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    provider_name: String,
}

impl OpenAiCompatProvider {
    pub fn new(base_url: String, api_key: Option<String>, model: String, provider_name: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
            provider_name,
        }
    }

    fn request(&self, tools: &[ToolSchema]) -> reqwest::RequestBuilder {
        let builder = self.client.post(format!("{}/chat/completions", self.base_url));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
        .header("x-oasis-provider", &self.provider_name)
        .header("x-oasis-tool-count", tools.len().to_string())
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn complete(&self, system: &str, user_message: &str, params: &GenerationParams) -> Result<LlmResponse, LlmError> {
        let completion = self.complete_with_tools(system, user_message, &[], params).await?;
        Ok(LlmResponse {
            text: completion.text.unwrap_or_default(),
            usage: completion.usage,
            model: self.model.clone(),
        })
    }

    async fn complete_with_tools(
        &self,
        system: &str,
        user_message: &str,
        tools: &[ToolSchema],
        params: &GenerationParams,
    ) -> Result<ToolCompletion, LlmError> {
        tracing::debug!(
            provider = %self.provider_name,
            model = %self.model,
            tool_count = tools.len(),
            max_tokens = params.max_tokens,
            "LLM request",
        );

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user_message },
            ],
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            tools: tools
                .iter()
                .map(|t| ToolDefinition {
                    kind: "function",
                    function: ToolFunction {
                        name: &t.name,
                        description: &t.description,
                        parameters: t.parameters.clone(),
                    },
                })
                .collect(),
        };

        let response = self.request(tools).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, message: body });
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("failed to parse response: {e}")))?;

        let choice = body.choices.into_iter().next().unwrap_or_default();
        let tool_calls = choice
            .message
            .tool_calls
            .into_iter()
            .map(|tc| {
                let arguments = serde_json::from_str(&tc.function.arguments).unwrap_or(serde_json::Value::Null);
                ToolCall { name: tc.function.name, arguments }
            })
            .collect();

        let usage = body.usage.map_or_else(TokenUsage::default, |u| TokenUsage {
            input_tokens: u.prompt_tokens.unwrap_or(0),
            output_tokens: u.completion_tokens.unwrap_or(0),
        });

        Ok(ToolCompletion {
            tool_calls,
            text: choice.message.content,
            usage,
        })
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolDefinition<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ToolDefinition<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    function: ToolFunction<'a>,
}

#[derive(Serialize)]
struct ToolFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: serde_json::Value,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize, Default)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Default)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallWire>,
}

#[derive(Deserialize)]
struct ToolCallWire {
    function: ToolCallFunctionWire,
}

#[derive(Deserialize)]
struct ToolCallFunctionWire {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
}
