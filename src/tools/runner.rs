//! Tool runner - the dispatcher between model tool calls and tool code

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{
    ChangeTracker, EditFileTool, ListDirectoryTool, ReadFileTool, RunCommandTool, Sandbox,
    SearchCodeTool, Tool, ToolOutput, WriteFileTool,
};
use crate::error::Error;
use crate::Result;

/// Tool definition for LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// Parameter name to `{type, description}` schema.
    pub parameters: Map<String, Value>,
    pub required: Vec<String>,
}

/// What the model sees for one tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub content: String,
    pub is_error: bool,
}

/// Tool runner manages registered tools and executes them.
///
/// Registration order is kept so the catalog sent to the model is stable.
pub struct ToolRunner {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRunner {
    /// Create an empty tool runner
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Create a tool runner with the standard six workspace tools
    pub fn new_with_defaults(sandbox: Sandbox) -> Self {
        let mut runner = Self::new();

        runner.register(ReadFileTool::new(sandbox.clone()));
        runner.register(WriteFileTool::new(sandbox.clone()));
        runner.register(EditFileTool::new(sandbox.clone()));
        runner.register(ListDirectoryTool::new(sandbox.clone()));
        runner.register(SearchCodeTool::new(sandbox.clone()));
        runner.register(RunCommandTool::new(sandbox));

        runner
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(Box::new(tool));
    }

    /// Get tool definitions for LLM
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, params: Value) -> Result<ToolOutput> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| Error::Tool(format!("Unknown tool: {}", name)))?;

        tool.execute(params).await
    }

    /// Execute a tool call on behalf of the model.
    ///
    /// Failures never escape: they come back as an error-flagged outcome so
    /// the conversation can continue. Successful mutations are recorded in
    /// `tracker`.
    pub async fn dispatch(
        &self,
        name: &str,
        params: Value,
        tracker: &mut ChangeTracker,
    ) -> ToolOutcome {
        debug!("Executing tool: {} with args: {}", name, params);

        match self.execute(name, params).await {
            Ok(output) => {
                if let Some(path) = output.changed {
                    tracker.track(path);
                }
                debug!("Tool {} succeeded: {} chars", name, output.content.len());
                ToolOutcome {
                    content: output.content,
                    is_error: false,
                }
            }
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                ToolOutcome {
                    content: e.to_string(),
                    is_error: true,
                }
            }
        }
    }

    /// Check if a tool exists
    pub fn has(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name() == name)
    }
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::new()
    }
}
