//! Ticketflow - LLM coding agent that implements a ticket in a repository
//!
//! This library provides the provider-neutral agent loop, the Anthropic,
//! OpenAI and Gemini adapters, and the sandboxed workspace tools the model
//! edits code with.

pub mod agent;
pub mod config;
pub mod error;
pub mod output;
pub mod tools;

pub use error::{Error, Result};
