//! Edit tool - replace a unique snippet in a file

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_args, Sandbox, Tool, ToolOutput};
use crate::error::Error;
use crate::Result;

#[derive(Deserialize)]
struct EditArgs {
    path: String,
    old_string: String,
    new_string: String,
}

/// Replace exactly one occurrence of `old_string` with `new_string`.
///
/// Zero or multiple occurrences are refused rather than guessed at.
pub struct EditFileTool {
    sandbox: Sandbox,
}

impl EditFileTool {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for EditFileTool {
    fn name(&self) -> &str { "edit_file" }
    fn description(&self) -> &str {
        "Edit a file by replacing a specific string with a new string. The old_string must appear exactly once in the file."
    }

    fn parameters(&self) -> Value {
        json!({
            "path": {
                "type": "string",
                "description": "The file path relative to the repository root."
            },
            "old_string": {
                "type": "string",
                "description": "The exact string to find and replace. Must be unique in the file."
            },
            "new_string": {
                "type": "string",
                "description": "The string to replace old_string with."
            }
        })
    }

    fn required(&self) -> &[&str] { &["path", "old_string", "new_string"] }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let args: EditArgs = parse_args(self.name(), params)?;
        let abs = self.sandbox.resolve(&args.path)?;

        // An empty needle matches between every character.
        if args.old_string.is_empty() {
            return Err(Error::Tool("old_string must not be empty".to_string()));
        }

        let content = std::fs::read_to_string(&abs)
            .map_err(|e| Error::Tool(format!("failed to read {}: {}", args.path, e)))?;

        let new_content = replace_unique(&content, &args.old_string, &args.new_string)
            .map_err(|count| match count {
                0 => Error::Tool(format!("old_string not found in {}", args.path)),
                n => Error::Tool(format!(
                    "old_string found {} times in {}; it must be unique",
                    n, args.path
                )),
            })?;

        std::fs::write(&abs, new_content)
            .map_err(|e| Error::Tool(format!("failed to write {}: {}", args.path, e)))?;

        Ok(ToolOutput::changed(
            format!("Successfully edited {}", args.path),
            self.sandbox.relative(&abs),
        ))
    }
}

/// Replace the single occurrence of `old` in `content`, or report how many
/// occurrences were found when that number is not exactly one.
fn replace_unique(content: &str, old: &str, new: &str) -> std::result::Result<String, usize> {
    match content.matches(old).count() {
        1 => Ok(content.replacen(old, new, 1)),
        n => Err(n),
    }
}
