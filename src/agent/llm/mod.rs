//! LLM client abstraction layer.
//!
//! This module provides:
//! - [`LlmClient`] trait, the single `chat` capability every backend offers
//! - [`ProviderRegistry`] for creating a client from a provider name
//! - Concrete implementations: Anthropic Messages, OpenAI Chat Completions,
//!   Gemini `generateContent`
//!
//! Each adapter owns the translation between the neutral
//! [`ChatRequest`]/[`ChatResponse`] pair and its vendor's wire format,
//! including mapping the vendor's finish signal onto [`StopReason`](super::message::StopReason).
//!
//! # Adding a New Provider
//!
//! 1. Create a new file (e.g., `mistral.rs`)
//! 2. Implement `LlmClient` trait
//! 3. Add a [`ProviderKind`] variant and its aliases
//! 4. Add it to `ProviderRegistry::create()`

pub mod claude;
pub mod gemini;
pub mod openai;
mod schema;
mod types;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Config;
use crate::error::Error;
use crate::Result;

use super::message::{ChatRequest, ChatResponse};

pub use claude::ClaudeClient;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

/// LLM client trait: swappable provider abstraction.
///
/// One call is one synchronous round trip: no retries, no streaming.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send the conversation and get the model's reply.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// The model this client talks to.
    fn model(&self) -> &str;
}

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for Box<T> {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        (**self).chat(request).await
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}

/// The supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Claude,
    OpenAi,
    Gemini,
}

impl ProviderKind {
    /// Resolve a provider name or one of its aliases.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "claude" | "anthropic" => Some(Self::Claude),
            "openai" | "gpt" => Some(Self::OpenAi),
            "gemini" | "google" => Some(Self::Gemini),
            _ => None,
        }
    }

    /// Model used when the configuration leaves it blank.
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Claude => "claude-sonnet-4-5-20250929",
            Self::OpenAi => "gpt-4o",
            Self::Gemini => "gemini-2.5-flash",
        }
    }
}

/// Provider registry: creates LLM clients dynamically.
///
/// # Example
///
/// ```ignore
/// let client = ProviderRegistry::create(&config)?;
/// let response = client.chat(&request).await?;
/// ```
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Create an LLM client from configuration.
    ///
    /// Unknown provider names fail here, before any request is made.
    pub fn create(config: &Config) -> Result<Box<dyn LlmClient>> {
        let kind = ProviderKind::parse(&config.provider).ok_or_else(|| {
            Error::Config(format!(
                "Unknown provider {:?}; supported: {}",
                config.provider,
                Self::available().join(", ")
            ))
        })?;

        let model = config.effective_model();
        let base = config.api_base.as_deref();

        let client: Box<dyn LlmClient> = match kind {
            ProviderKind::Claude => Box::new(ClaudeClient::new(&config.api_key, model, base)),
            ProviderKind::OpenAi => Box::new(OpenAiClient::new(&config.api_key, model, base)),
            ProviderKind::Gemini => Box::new(GeminiClient::new(&config.api_key, model, base)),
        };
        Ok(client)
    }

    /// List available provider names.
    pub fn available() -> &'static [&'static str] {
        &["claude", "openai", "gemini"]
    }
}

/// POST a JSON body and decode the JSON reply.
///
/// Non-success statuses and undecodable bodies both surface as
/// [`Error::Llm`]; transport failures surface as [`Error::Http`].
pub(crate) async fn post_json<T: DeserializeOwned>(
    provider: &str,
    request: RequestBuilder,
    body: &Value,
) -> Result<T> {
    let response = request.json(body).send().await?;
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(Error::Llm(format!("{provider} API error ({status}): {text}")));
    }

    serde_json::from_str(&text)
        .map_err(|e| Error::Llm(format!("{provider} returned a malformed reply: {e}")))
}

/// Scripted LLM client for testing.
#[cfg(test)]
pub struct FakeLlmClient {
    responses: std::sync::Mutex<std::collections::VecDeque<ChatResponse>>,
    requests: std::sync::Mutex<Vec<ChatRequest>>,
}

#[cfg(test)]
impl FakeLlmClient {
    /// Create with predefined responses, returned in order.
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl LlmClient for FakeLlmClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let mut responses = self.responses.lock().unwrap();
        responses
            .pop_front()
            .ok_or_else(|| Error::Llm("No more fake responses".to_string()))
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}
