//! Gemini `generateContent` client (API key authentication).
//!
//! Gemini has no per-call ids in its classic wire format: function calls are
//! `functionCall` parts on a `model` turn and results are `functionResponse`
//! parts on the next `user` turn, matched by function name. Ids are
//! synthesized on the way in and resolved back to names on the way out.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::error::Error;
use crate::Result;

use super::super::message::{ChatRequest, ChatResponse, ContentBlock, Message, Role, StopReason};
use super::schema::{gemini_schema, synthesize_call_id};
use super::types::GeminiResponse;
use super::{post_json, LlmClient};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini API client using API key authentication.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiClient {
    /// Create a new Gemini client. `base_url` overrides the public endpoint.
    pub fn new(api_key: &str, model: &str, base_url: Option<&str>) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url
                .unwrap_or(GEMINI_API_URL)
                .trim_end_matches('/')
                .to_string(),
            client: Client::new(),
        }
    }

    fn build_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn convert_messages(messages: &[Message]) -> Vec<Value> {
        // Correlation id -> function name, filled as calls are seen.
        let mut call_names: HashMap<&str, &str> = HashMap::new();
        let mut contents = Vec::with_capacity(messages.len());

        for m in messages {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "model",
            };

            let mut parts = Vec::with_capacity(m.content.len());
            for block in &m.content {
                match block {
                    ContentBlock::Text { text } if text.is_empty() => {}
                    ContentBlock::Text { text } => parts.push(json!({"text": text})),
                    ContentBlock::ToolUse { id, name, input } => {
                        call_names.insert(id.as_str(), name.as_str());
                        let args = if input.is_object() { input.clone() } else { json!({}) };
                        parts.push(json!({"functionCall": {"name": name, "args": args}}));
                    }
                    ContentBlock::ToolResult {
                        tool_use_id,
                        content,
                        is_error,
                    } => {
                        let name = call_names
                            .get(tool_use_id.as_str())
                            .copied()
                            .unwrap_or(tool_use_id.as_str());
                        let mut response = json!({"result": content});
                        if *is_error {
                            response["error"] = json!(true);
                        }
                        parts.push(json!({
                            "functionResponse": {"name": name, "response": response}
                        }));
                    }
                }
            }

            if !parts.is_empty() {
                contents.push(json!({"role": role, "parts": parts}));
            }
        }

        contents
    }

    fn build_body(&self, request: &ChatRequest) -> Value {
        let mut body = json!({
            "contents": Self::convert_messages(&request.messages),
            "generationConfig": {
                "maxOutputTokens": request.max_tokens
            }
        });

        if !request.system.is_empty() {
            body["systemInstruction"] = json!({
                "parts": [{"text": request.system}]
            });
        }

        if !request.tools.is_empty() {
            let function_declarations: Vec<Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "parameters": gemini_schema(t)
                    })
                })
                .collect();
            body["tools"] = json!([{"functionDeclarations": function_declarations}]);
        }

        body
    }

    fn parse_response(response: GeminiResponse) -> Result<ChatResponse> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| Error::Llm("No candidates in response".to_string()))?;

        let mut content = Vec::new();
        let mut has_calls = false;

        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(text) = part.text.filter(|t| !t.is_empty()) {
                content.push(ContentBlock::text(text));
            }
            if let Some(fc) = part.function_call {
                has_calls = true;
                let id = fc
                    .id
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(synthesize_call_id);
                content.push(ContentBlock::tool_use(id, fc.name, fc.args));
            }
        }

        let stop_reason = if has_calls {
            StopReason::ToolUse
        } else {
            map_finish_reason(candidate.finish_reason.as_deref())
        };

        Ok(ChatResponse {
            content,
            stop_reason,
        })
    }
}

/// Gemini reports `STOP` even when it emitted function calls, so a call
/// part takes precedence over this mapping.
fn map_finish_reason(reason: Option<&str>) -> StopReason {
    match reason {
        Some("MAX_TOKENS") => StopReason::MaxTokens,
        _ => StopReason::EndTurn,
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let body = self.build_body(request);
        let http = self
            .client
            .post(self.build_url())
            .header("x-goog-api-key", &self.api_key);

        let response: GeminiResponse = post_json("Gemini", http, &body).await?;
        Self::parse_response(response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
