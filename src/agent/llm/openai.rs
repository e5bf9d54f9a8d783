//! OpenAI Chat Completions client.
//!
//! Tool calls ride on the assistant message as `tool_calls`; their results go
//! back as separate `tool` role messages keyed by `tool_call_id`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::Error;
use crate::Result;

use super::super::message::{ChatRequest, ChatResponse, ContentBlock, Message, Role, StopReason};
use super::schema::{object_schema, synthesize_call_id};
use super::{post_json, LlmClient};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// OpenAI Chat Completions client.
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    #[serde(default)]
    id: String,
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl OpenAiClient {
    /// Create a new client. `base_url` overrides the public endpoint.
    pub fn new(api_key: &str, model: &str, base_url: Option<&str>) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url
                .unwrap_or(OPENAI_API_URL)
                .trim_end_matches('/')
                .to_string(),
            client: Client::new(),
        }
    }

    fn build_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn convert_messages(system: &str, messages: &[Message]) -> Vec<Value> {
        let mut out = Vec::with_capacity(messages.len() + 1);
        if !system.is_empty() {
            out.push(json!({"role": "system", "content": system}));
        }

        for m in messages {
            match m.role {
                Role::User => {
                    for block in &m.content {
                        match block {
                            ContentBlock::Text { text } => {
                                out.push(json!({"role": "user", "content": text}));
                            }
                            ContentBlock::ToolResult {
                                tool_use_id,
                                content,
                                is_error,
                            } => {
                                let content = if *is_error {
                                    format!("Error: {content}")
                                } else {
                                    content.clone()
                                };
                                out.push(json!({
                                    "role": "tool",
                                    "tool_call_id": tool_use_id,
                                    "content": content
                                }));
                            }
                            ContentBlock::ToolUse { .. } => {}
                        }
                    }
                }
                Role::Assistant => out.extend(convert_assistant(m)),
            }
        }
        out
    }

    fn build_body(&self, request: &ChatRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "max_completion_tokens": request.max_tokens,
            "messages": Self::convert_messages(&request.system, &request.messages),
        });

        if !request.tools.is_empty() {
            let tools: Vec<Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": object_schema(t)
                        }
                    })
                })
                .collect();
            body["tools"] = json!(tools);
        }

        body
    }

    fn parse_response(response: CompletionResponse) -> Result<ChatResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Llm("OpenAI returned no choices".to_string()))?;

        let mut content = Vec::new();
        if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
            content.push(ContentBlock::text(text));
        }
        for call in choice.message.tool_calls.unwrap_or_default() {
            let id = if call.id.is_empty() { synthesize_call_id() } else { call.id };
            content.push(ContentBlock::tool_use(
                id,
                call.function.name,
                parse_arguments(call.function.arguments),
            ));
        }

        Ok(ChatResponse {
            content,
            stop_reason: map_finish_reason(choice.finish_reason.as_deref()),
        })
    }
}

/// Collapse an assistant turn into one message: text joined, calls listed.
/// `None` for a turn with neither text nor calls; OpenAI rejects an
/// assistant message that carries nothing.
fn convert_assistant(message: &Message) -> Option<Value> {
    let mut texts = Vec::new();
    let mut calls = Vec::new();

    for block in &message.content {
        match block {
            ContentBlock::Text { text } => texts.push(text.as_str()),
            ContentBlock::ToolUse { id, name, input } => {
                // Arguments that never parsed are replayed verbatim.
                let arguments = match input {
                    Value::String(raw) => raw.clone(),
                    other => other.to_string(),
                };
                calls.push(json!({
                    "id": id,
                    "type": "function",
                    "function": {"name": name, "arguments": arguments}
                }));
            }
            ContentBlock::ToolResult { .. } => {}
        }
    }

    let text = texts.join("\n");
    if text.is_empty() && calls.is_empty() {
        return None;
    }

    let content = if text.is_empty() { Value::Null } else { Value::String(text) };
    let mut msg = json!({"role": "assistant", "content": content});
    if !calls.is_empty() {
        msg["tool_calls"] = json!(calls);
    }
    Some(msg)
}

/// Decode the JSON-encoded argument string. Unparsable payloads are kept as a
/// raw string so the dispatcher can report them to the model.
fn parse_arguments(raw: String) -> Value {
    if raw.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

fn map_finish_reason(reason: Option<&str>) -> StopReason {
    match reason {
        Some("tool_calls") | Some("function_call") => StopReason::ToolUse,
        Some("length") => StopReason::MaxTokens,
        _ => StopReason::EndTurn,
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let body = self.build_body(request);
        let http = self.client.post(self.build_url()).bearer_auth(&self.api_key);

        let response: CompletionResponse = post_json("OpenAI", http, &body).await?;
        Self::parse_response(response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolDefinition;

    fn tool() -> ToolDefinition {
        let mut parameters = serde_json::Map::new();
        parameters.insert("command".into(), json!({"type": "string", "description": "Shell command"}));
        ToolDefinition {
            name: "run_command".to_string(),
            description: "Run a command".to_string(),
            parameters,
            required: vec!["command".to_string()],
        }
    }

    #[test]
    fn test_build_body_translates_turns() {
        let client = OpenAiClient::new("key", "gpt-test", None);
        let request = ChatRequest {
            system: "sys".to_string(),
            messages: vec![
                Message::user_text("Run the tests"),
                Message::assistant(vec![
                    ContentBlock::text("Running"),
                    ContentBlock::tool_use("call_a", "run_command", json!({"command": "make test"})),
                    ContentBlock::tool_use("call_b", "run_command", json!({"command": "make lint"})),
                ]),
                Message::user(vec![
                    ContentBlock::tool_result("call_a", "ok", false),
                    ContentBlock::tool_result("call_b", "lint failed", true),
                ]),
            ],
            tools: vec![tool()],
            max_tokens: 1024,
        };

        let body = client.build_body(&request);
        assert_eq!(body["model"], "gpt-test");
        assert_eq!(body["max_completion_tokens"], 1024);
        assert_eq!(
            body["tools"][0]["function"]["parameters"],
            json!({
                "type": "object",
                "properties": {"command": {"type": "string", "description": "Shell command"}},
                "required": ["command"]
            })
        );

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0], json!({"role": "system", "content": "sys"}));
        assert_eq!(messages[1], json!({"role": "user", "content": "Run the tests"}));
        assert_eq!(messages[2]["content"], "Running");
        assert_eq!(messages[2]["tool_calls"][0]["id"], "call_a");
        assert_eq!(
            messages[2]["tool_calls"][1]["function"],
            json!({"name": "run_command", "arguments": "{\"command\":\"make lint\"}"})
        );
        assert_eq!(
            messages[3],
            json!({"role": "tool", "tool_call_id": "call_a", "content": "ok"})
        );
        assert_eq!(
            messages[4],
            json!({"role": "tool", "tool_call_id": "call_b", "content": "Error: lint failed"})
        );
    }

    #[test]
    fn test_assistant_without_text_has_null_content() {
        let msg = convert_assistant(&Message::assistant(vec![ContentBlock::tool_use(
            "c1",
            "read_file",
            json!({"path": "a"}),
        )]))
        .unwrap();
        assert!(msg["content"].is_null());
        assert_eq!(msg["tool_calls"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_assistant_turn_is_skipped() {
        let client = OpenAiClient::new("key", "gpt-test", None);
        let request = ChatRequest {
            system: String::new(),
            messages: vec![
                Message::user_text("Go"),
                Message::assistant(vec![]),
                Message::assistant(vec![ContentBlock::text("")]),
                Message::user_text("Continue"),
            ],
            tools: vec![],
            max_tokens: 64,
        };

        let body = client.build_body(&request);
        assert_eq!(
            body["messages"],
            json!([
                {"role": "user", "content": "Go"},
                {"role": "user", "content": "Continue"}
            ])
        );
    }

    #[test]
    fn test_parse_tool_calls() {
        let raw: CompletionResponse = serde_json::from_value(json!({
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "call_1", "type": "function", "function": {"name": "read_file", "arguments": "{\"path\":\"a.txt\"}"}},
                        {"id": "call_2", "type": "function", "function": {"name": "write_file", "arguments": "{oops"}}
                    ]
                },
                "finish_reason": "tool_calls"
            }]
        }))
        .unwrap();

        let response = OpenAiClient::parse_response(raw).unwrap();
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(
            response.content,
            vec![
                ContentBlock::tool_use("call_1", "read_file", json!({"path": "a.txt"})),
                ContentBlock::tool_use("call_2", "write_file", json!("{oops")),
            ]
        );
    }

    #[test]
    fn test_parse_text_reply() {
        let raw: CompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": "Done."}, "finish_reason": "stop"}]
        }))
        .unwrap();

        let response = OpenAiClient::parse_response(raw).unwrap();
        assert_eq!(response, ChatResponse::text("Done."));
    }

    #[test]
    fn test_parse_no_choices_is_error() {
        let raw: CompletionResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(OpenAiClient::parse_response(raw), Err(Error::Llm(_))));
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(map_finish_reason(Some("tool_calls")), StopReason::ToolUse);
        assert_eq!(map_finish_reason(Some("function_call")), StopReason::ToolUse);
        assert_eq!(map_finish_reason(Some("length")), StopReason::MaxTokens);
        assert_eq!(map_finish_reason(Some("stop")), StopReason::EndTurn);
        assert_eq!(map_finish_reason(Some("content_filter")), StopReason::EndTurn);
        assert_eq!(map_finish_reason(None), StopReason::EndTurn);
    }

    #[test]
    fn test_empty_arguments_become_empty_object() {
        assert_eq!(parse_arguments(String::new()), json!({}));
    }
}
