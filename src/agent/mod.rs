//! Agent module: core agent logic.
//!
//! This module contains:
//! - The provider-neutral message model
//! - LLM client trait and implementations
//! - Agent loop that drives tool calls to completion
//! - Prompt and repository context for a run
//!
//! # Adding a New LLM Provider
//!
//! See [`llm::ProviderRegistry`] for instructions.

pub mod context;
mod loop_impl;
mod message;

// LLM providers in submodule
pub mod llm;

// Re-exports for convenience
pub use llm::{LlmClient, ProviderKind, ProviderRegistry};
pub use loop_impl::{AgentLoop, RunOutcome, RunResult, DEFAULT_SUMMARY};
pub use message::{ChatRequest, ChatResponse, ContentBlock, Message, Role, StopReason};
