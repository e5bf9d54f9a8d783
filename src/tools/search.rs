//! Search tool - plain substring search across the workspace

use std::fmt::Write as _;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use walkdir::{DirEntry, WalkDir};

use super::{parse_args, Sandbox, Tool, ToolOutput};
use crate::error::Error;
use crate::Result;

/// Maximum number of matching lines returned.
pub const MAX_MATCHES: usize = 100;

/// Files larger than this are skipped.
pub const MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Returned when nothing matches.
pub const NO_MATCHES: &str = "No matches found.";

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &["node_modules", "vendor", "__pycache__", "target"];

#[derive(Deserialize)]
struct SearchArgs {
    pattern: String,
    #[serde(default)]
    path: Option<String>,
}

/// Search for text in files
pub struct SearchCodeTool {
    sandbox: Sandbox,
}

impl SearchCodeTool {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

#[async_trait]
impl Tool for SearchCodeTool {
    fn name(&self) -> &str { "search_code" }
    fn description(&self) -> &str {
        "Search for a text pattern in files under the given directory. Returns matching lines with file paths and line numbers."
    }

    fn parameters(&self) -> Value {
        json!({
            "pattern": {
                "type": "string",
                "description": "The text pattern to search for."
            },
            "path": {
                "type": "string",
                "description": "The directory to search in, relative to repo root. Use '.' for the entire repo."
            }
        })
    }

    fn required(&self) -> &[&str] { &["pattern"] }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let args: SearchArgs = parse_args(self.name(), params)?;
        let path = args.path.filter(|p| !p.is_empty()).unwrap_or_else(|| ".".to_string());
        let root = self.sandbox.resolve(&path)?;

        if args.pattern.is_empty() {
            return Err(Error::Tool("pattern must not be empty".to_string()));
        }
        if !root.exists() {
            return Err(Error::Tool(format!("failed to search {}: path does not exist", path)));
        }

        let mut out = String::new();
        let mut matches = 0usize;

        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped_dir(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file());

        'files: for entry in walker {
            let too_big = entry.metadata().map(|m| m.len() > MAX_FILE_SIZE).unwrap_or(true);
            if too_big {
                continue;
            }
            // Non-UTF-8 files are treated as binary and skipped.
            let Ok(content) = std::fs::read_to_string(entry.path()) else {
                continue;
            };

            let rel = self.sandbox.relative(entry.path());
            for (i, line) in content.split('\n').enumerate() {
                if !line.contains(&args.pattern) {
                    continue;
                }
                let _ = writeln!(out, "{}:{}: {}", rel, i + 1, line);
                matches += 1;
                if matches >= MAX_MATCHES {
                    let _ = write!(out, "\n... truncated at {} matches\n", MAX_MATCHES);
                    break 'files;
                }
            }
        }

        if out.is_empty() {
            return Ok(ToolOutput::text(NO_MATCHES));
        }
        Ok(ToolOutput::text(out))
    }
}
