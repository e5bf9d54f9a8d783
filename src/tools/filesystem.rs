//! Filesystem tools - read, write, and list files

use std::fmt::Write as _;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_args, Sandbox, Tool, ToolOutput};
use crate::error::Error;
use crate::Result;

#[derive(Deserialize)]
struct PathArgs {
    path: String,
}

/// Read file contents with line numbers
pub struct ReadFileTool {
    sandbox: Sandbox,
}

impl ReadFileTool {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str { "read_file" }
    fn description(&self) -> &str { "Read the contents of a file. Returns the file with line numbers." }

    fn parameters(&self) -> Value {
        json!({
            "path": {
                "type": "string",
                "description": "The file path relative to the repository root."
            }
        })
    }

    fn required(&self) -> &[&str] { &["path"] }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let args: PathArgs = parse_args(self.name(), params)?;
        let abs = self.sandbox.resolve(&args.path)?;

        let bytes = std::fs::read(&abs)
            .map_err(|e| Error::Tool(format!("failed to read {}: {}", args.path, e)))?;

        Ok(ToolOutput::text(number_lines(&String::from_utf8_lossy(&bytes))))
    }
}

/// Prefix every line with its 1-based number.
fn number_lines(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + content.len() / 8);
    for (i, line) in content.split('\n').enumerate() {
        let _ = writeln!(out, "{:4} | {}", i + 1, line);
    }
    out
}

#[derive(Deserialize)]
struct WriteArgs {
    path: String,
    content: String,
}

/// Create or overwrite a file
pub struct WriteFileTool {
    sandbox: Sandbox,
}

impl WriteFileTool {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str { "write_file" }
    fn description(&self) -> &str {
        "Create a new file or completely overwrite an existing file with the given content."
    }

    fn parameters(&self) -> Value {
        json!({
            "path": {
                "type": "string",
                "description": "The file path relative to the repository root."
            },
            "content": {
                "type": "string",
                "description": "The complete file content to write."
            }
        })
    }

    fn required(&self) -> &[&str] { &["path", "content"] }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let args: WriteArgs = parse_args(self.name(), params)?;
        let abs = self.sandbox.resolve(&args.path)?;

        if let Some(parent) = abs.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Tool(format!("failed to create directories for {}: {}", args.path, e))
            })?;
        }

        std::fs::write(&abs, &args.content)
            .map_err(|e| Error::Tool(format!("failed to write {}: {}", args.path, e)))?;

        Ok(ToolOutput::changed(
            format!("Successfully wrote {}", args.path),
            self.sandbox.relative(&abs),
        ))
    }
}

#[derive(Deserialize)]
struct ListArgs {
    #[serde(default)]
    path: Option<String>,
}

/// List directory contents
pub struct ListDirectoryTool {
    sandbox: Sandbox,
}

impl ListDirectoryTool {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &str { "list_directory" }
    fn description(&self) -> &str { "List files and subdirectories at the given path." }

    fn parameters(&self) -> Value {
        json!({
            "path": {
                "type": "string",
                "description": "The directory path relative to the repository root. Use '.' for the root."
            }
        })
    }

    fn required(&self) -> &[&str] { &["path"] }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let args: ListArgs = parse_args(self.name(), params)?;
        let path = args.path.filter(|p| !p.is_empty()).unwrap_or_else(|| ".".to_string());
        let abs = self.sandbox.resolve(&path)?;

        let mut entries: Vec<String> = std::fs::read_dir(&abs)
            .map_err(|e| Error::Tool(format!("failed to list {}: {}", path, e)))?
            .filter_map(|e| e.ok())
            .map(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                let is_dir = e.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
                if is_dir { format!("{}/", name) } else { name }
            })
            .collect();
        entries.sort();

        let mut out = String::new();
        for entry in entries {
            out.push_str(&entry);
            out.push('\n');
        }
        Ok(ToolOutput::text(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Sandbox) {
        let tmp = TempDir::new().unwrap();
        let sandbox = Sandbox::new(tmp.path()).unwrap();
        (tmp, sandbox)
    }

    #[tokio::test]
    async fn test_read_file_numbers_lines() {
        let (tmp, sb) = setup();
        std::fs::write(tmp.path().join("a.txt"), "hello\nworld").unwrap();

        let out = ReadFileTool::new(sb).execute(json!({"path": "a.txt"})).await.unwrap();
        assert_eq!(out.content, "   1 | hello\n   2 | world\n");
        assert_eq!(out.changed, None);
    }

    #[tokio::test]
    async fn test_read_file_non_utf8_is_lossy() {
        let (tmp, sandbox) = setup();
        std::fs::write(tmp.path().join("latin1.txt"), b"caf\xe9\n").unwrap();

        let tool = ReadFileTool::new(sandbox);
        let out = tool.execute(json!({"path": "latin1.txt"})).await.unwrap();
        assert_eq!(out.content, "   1 | caf\u{FFFD}\n   2 | \n");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let (_tmp, sb) = setup();
        let err = ReadFileTool::new(sb).execute(json!({"path": "nope.txt"})).await.unwrap_err();
        assert!(err.to_string().contains("failed to read nope.txt"));
    }

    #[tokio::test]
    async fn test_write_creates_parent_dirs() {
        let (tmp, sb) = setup();
        let out = WriteFileTool::new(sb)
            .execute(json!({"path": "new/dir/file.txt", "content": "x"}))
            .await
            .unwrap();

        assert!(out.content.contains("Successfully wrote new/dir/file.txt"));
        assert_eq!(out.changed.as_deref(), Some("new/dir/file.txt"));
        let written = std::fs::read_to_string(tmp.path().join("new/dir/file.txt")).unwrap();
        assert_eq!(written, "x");
    }

    #[tokio::test]
    async fn test_write_outside_workspace_does_no_io() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("ws");
        std::fs::create_dir(&root).unwrap();
        let sb = Sandbox::new(&root).unwrap();

        let err = WriteFileTool::new(sb)
            .execute(json!({"path": "../escaped.txt", "content": "x"}))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::OutsideWorkspace(_)));
        assert!(!tmp.path().join("escaped.txt").exists());
    }

    #[tokio::test]
    async fn test_list_directory() {
        let (tmp, sb) = setup();
        std::fs::write(tmp.path().join("b.txt"), "").unwrap();
        std::fs::write(tmp.path().join("a.txt"), "").unwrap();
        std::fs::create_dir(tmp.path().join("subdir")).unwrap();

        let out = ListDirectoryTool::new(sb).execute(json!({"path": "."})).await.unwrap();
        assert_eq!(out.content, "a.txt\nb.txt\nsubdir/\n");
    }

    #[tokio::test]
    async fn test_list_directory_defaults_to_root() {
        let (tmp, sb) = setup();
        std::fs::write(tmp.path().join("only.txt"), "").unwrap();

        let out = ListDirectoryTool::new(sb).execute(json!({})).await.unwrap();
        assert_eq!(out.content, "only.txt\n");
    }

    #[tokio::test]
    async fn test_list_directory_rejects_escape() {
        let (_tmp, sb) = setup();
        let err = ListDirectoryTool::new(sb).execute(json!({"path": "../.."})).await.unwrap_err();
        assert!(matches!(err, Error::OutsideWorkspace(_)));
    }
}
