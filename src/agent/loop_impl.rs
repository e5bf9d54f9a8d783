//! Agent loop - drives the model through a bounded tool-calling conversation

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Error;
use crate::tools::{ChangeTracker, Sandbox, ToolRunner};
use crate::Result;

use super::llm::{LlmClient, ProviderRegistry};
use super::message::{ChatRequest, ContentBlock, Message, StopReason};

/// Summary reported when the model never produced any text.
pub const DEFAULT_SUMMARY: &str = "Agent completed implementation.";

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The model ended its turn after `turns` turns.
    Completed { turns: usize },
    /// The turn budget ran out before the model ended its turn.
    BudgetExhausted { turns: usize },
}

/// Result of a run, handed to whoever reports it.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub summary: String,
    pub files_changed: Vec<String>,
    pub outcome: RunOutcome,
}

/// The agent loop sends the conversation to the model, executes the tool
/// calls it asks for, and feeds the results back until the model is done.
pub struct AgentLoop<C: LlmClient> {
    client: C,
    tool_runner: ToolRunner,
    max_turns: usize,
    max_tokens: u32,
}

impl AgentLoop<Box<dyn LlmClient>> {
    /// Build a loop with the configured provider and the standard tools.
    pub fn from_config(config: &Config) -> Result<Self> {
        if !config.workspace.is_dir() {
            return Err(Error::Config(format!(
                "Workspace {:?} is not a directory",
                config.workspace
            )));
        }

        let client = ProviderRegistry::create(config)?;
        let sandbox = Sandbox::new(&config.workspace)?;
        let runner = ToolRunner::new_with_defaults(sandbox);

        Ok(Self::new(client, runner, config.max_turns).with_max_tokens(config.max_tokens))
    }
}

impl<C: LlmClient> AgentLoop<C> {
    /// Create a new agent loop
    pub fn new(client: C, tool_runner: ToolRunner, max_turns: usize) -> Self {
        Self {
            client,
            tool_runner,
            max_turns,
            max_tokens: 8192,
        }
    }

    /// Set the output token limit sent with every request
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The backend this loop talks to.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run to completion.
    pub async fn run(&self, system: &str, initial_message: &str) -> Result<RunResult> {
        self.run_with_cancel(system, initial_message, &CancellationToken::new())
            .await
    }

    /// Run to completion, stopping with [`Error::Cancelled`] if `cancel`
    /// fires. Cancellation is observed before each turn and while waiting on
    /// the model; a tool call already running is allowed to finish.
    pub async fn run_with_cancel(
        &self,
        system: &str,
        initial_message: &str,
        cancel: &CancellationToken,
    ) -> Result<RunResult> {
        let mut request = ChatRequest {
            system: system.to_string(),
            messages: vec![Message::user_text(initial_message)],
            tools: self.tool_runner.definitions(),
            max_tokens: self.max_tokens,
        };
        let mut tracker = ChangeTracker::new();
        let mut summary_parts: Vec<String> = Vec::new();

        for turn in 1..=self.max_turns {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            info!("[turn {}] Sending request to {}", turn, self.client.model());

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                response = self.client.chat(&request) => response?,
            };

            info!(
                "[turn {}] Stop reason: {}, content blocks: {}",
                turn,
                response.stop_reason,
                response.content.len()
            );

            let mut results = Vec::new();
            for block in &response.content {
                match block {
                    ContentBlock::Text { text } => {
                        info!("[turn {}] Text: {}", turn, truncate(text, 200));
                        if !text.is_empty() {
                            summary_parts.push(text.clone());
                        }
                    }
                    ContentBlock::ToolUse { id, name, input } => {
                        info!("[turn {}] Tool call: {}", turn, name);
                        let outcome = self
                            .tool_runner
                            .dispatch(name, input.clone(), &mut tracker)
                            .await;
                        debug!(
                            "[turn {}] Tool result ({}): {}",
                            turn,
                            name,
                            truncate(&outcome.content, 200)
                        );
                        results.push(ContentBlock::tool_result(
                            id.clone(),
                            outcome.content,
                            outcome.is_error,
                        ));
                    }
                    // Adapters never hand results back from the model.
                    ContentBlock::ToolResult { .. } => {}
                }
            }

            request.messages.push(Message::assistant(response.content));
            if !results.is_empty() {
                request.messages.push(Message::user(results));
            }

            if response.stop_reason == StopReason::EndTurn {
                info!("Agent completed after {} turns", turn);
                return Ok(self.finish(summary_parts, &tracker, RunOutcome::Completed { turns: turn }));
            }
        }

        warn!("Turn budget of {} exhausted before the model finished", self.max_turns);
        Ok(self.finish(
            summary_parts,
            &tracker,
            RunOutcome::BudgetExhausted {
                turns: self.max_turns,
            },
        ))
    }

    fn finish(&self, parts: Vec<String>, tracker: &ChangeTracker, outcome: RunOutcome) -> RunResult {
        let summary = if parts.is_empty() {
            DEFAULT_SUMMARY.to_string()
        } else {
            parts.join("\n")
        };
        RunResult {
            summary,
            files_changed: tracker.files(),
            outcome,
        }
    }
}

/// Shorten `s` to at most `max` characters for log output.
fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
