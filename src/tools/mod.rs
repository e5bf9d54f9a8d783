//! Tools module - agent capabilities
//!
//! Tools are the actions the model can take against the workspace: reading,
//! writing and editing files, listing directories, searching code and running
//! shell commands. Every filesystem path goes through [`Sandbox`] first.

mod edit;
mod filesystem;
mod runner;
mod sandbox;
mod search;
mod shell;
mod tracker;

pub use edit::EditFileTool;
pub use filesystem::{ListDirectoryTool, ReadFileTool, WriteFileTool};
pub use runner::{ToolDefinition, ToolOutcome, ToolRunner};
pub use sandbox::Sandbox;
pub use search::SearchCodeTool;
pub use shell::RunCommandTool;
pub use tracker::ChangeTracker;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;
use crate::Result;

/// Successful result of a tool execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Text handed back to the model.
    pub content: String,
    /// Workspace-relative path the tool mutated, if any.
    pub changed: Option<String>,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            changed: None,
        }
    }

    pub fn changed(content: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            changed: Some(path.into()),
        }
    }
}

/// Tool trait - interface for all agent tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used in function calls
    fn name(&self) -> &str;

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// Parameter name to `{type, description}` schema, as a JSON object
    fn parameters(&self) -> Value;

    /// Names of the parameters the model must supply
    fn required(&self) -> &[&str];

    /// Execute the tool with given parameters
    async fn execute(&self, params: Value) -> Result<ToolOutput>;

    /// Convert to tool definition for LLM
    fn to_definition(&self) -> ToolDefinition {
        let parameters = match self.parameters() {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters,
            required: self.required().iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Decode a tool's argument payload into its typed form.
///
/// A missing payload is treated as an empty object so optional-only tools
/// still decode.
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, params: Value) -> Result<T> {
    let params = match params {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };
    serde_json::from_value(params)
        .map_err(|e| Error::Tool(format!("Invalid arguments for {tool}: {e}")))
}
