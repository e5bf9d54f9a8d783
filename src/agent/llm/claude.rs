//! Anthropic Messages API client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::Result;

use super::super::message::{ChatRequest, ChatResponse, ContentBlock, Message, Role, StopReason};
use super::schema::{object_schema, synthesize_call_id};
use super::{post_json, LlmClient};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API client.
#[derive(Clone)]
pub struct ClaudeClient {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        #[serde(default)]
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

impl ClaudeClient {
    /// Create a new client. `base_url` overrides the public endpoint.
    pub fn new(api_key: &str, model: &str, base_url: Option<&str>) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url
                .unwrap_or(ANTHROPIC_API_URL)
                .trim_end_matches('/')
                .to_string(),
            client: Client::new(),
        }
    }

    fn build_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    fn convert_messages(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .filter_map(|m| {
                let role = match m.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                let blocks: Vec<Value> = m.content.iter().filter_map(convert_block).collect();
                if blocks.is_empty() {
                    None
                } else {
                    Some(json!({"role": role, "content": blocks}))
                }
            })
            .collect()
    }

    fn build_body(&self, request: &ChatRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "messages": Self::convert_messages(&request.messages),
        });

        if !request.system.is_empty() {
            body["system"] = json!(request.system);
        }

        if !request.tools.is_empty() {
            let tools: Vec<Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "input_schema": object_schema(t)
                    })
                })
                .collect();
            body["tools"] = json!(tools);
        }

        body
    }

    fn parse_response(response: MessagesResponse) -> ChatResponse {
        let content = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(ContentBlock::text(text)),
                ResponseBlock::ToolUse { id, name, input } => {
                    let id = if id.is_empty() { synthesize_call_id() } else { id };
                    Some(ContentBlock::tool_use(id, name, input))
                }
                ResponseBlock::Other => None,
            })
            .collect();

        ChatResponse {
            content,
            stop_reason: map_stop_reason(response.stop_reason.as_deref()),
        }
    }
}

fn convert_block(block: &ContentBlock) -> Option<Value> {
    match block {
        // The API rejects empty text blocks.
        ContentBlock::Text { text } if text.is_empty() => None,
        ContentBlock::Text { text } => Some(json!({"type": "text", "text": text})),
        ContentBlock::ToolUse { id, name, input } => {
            let input = if input.is_object() { input.clone() } else { json!({}) };
            Some(json!({"type": "tool_use", "id": id, "name": name, "input": input}))
        }
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => Some(json!({
            "type": "tool_result",
            "tool_use_id": tool_use_id,
            "content": content,
            "is_error": is_error
        })),
    }
}

fn map_stop_reason(reason: Option<&str>) -> StopReason {
    match reason {
        Some("tool_use") => StopReason::ToolUse,
        Some("max_tokens") => StopReason::MaxTokens,
        _ => StopReason::EndTurn,
    }
}

#[async_trait]
impl LlmClient for ClaudeClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let body = self.build_body(request);
        let http = self
            .client
            .post(self.build_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION);

        let response: MessagesResponse = post_json("Claude", http, &body).await?;
        Ok(Self::parse_response(response))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
