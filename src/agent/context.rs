//! Prompt text and repository context for a run.

use std::fmt::Write as _;
use std::path::Path;

/// How deep [`repo_tree`] descends by default.
pub const DEFAULT_TREE_DEPTH: usize = 3;

/// Entries never shown in the tree.
const HIDDEN_NAMES: &[&str] = &["node_modules", "vendor", "__pycache__", "target"];

/// Build the system prompt describing the ticket and how to work on it.
pub fn build_system_prompt(ticket_key: &str, ticket_title: &str, ticket_description: &str) -> String {
    format!(
        r#"You are an expert software engineer. Your task is to implement a ticket by modifying the codebase in the current repository.

## Ticket
Key: {ticket_key}
Title: {ticket_title}
Description:
{ticket_description}

## Instructions
1. Start by exploring the repository structure using list_directory to understand the codebase layout.
2. Read relevant files to understand existing code patterns, conventions, and architecture.
3. Implement the changes described in the ticket.
4. Follow the existing code style and patterns you observe in the repository.
5. Write clean, production-ready code.
6. Only modify or create files directly related to the ticket requirements.
7. If the ticket requires new dependencies, mention them but do not run install commands.

## Guidelines
- Prefer editing existing files over creating new ones when possible.
- Use edit_file for targeted changes to existing files.
- Use write_file only for new files or complete rewrites.
- Always read a file before editing it.
- Keep changes minimal and focused on the ticket requirements.
- Do not add unnecessary comments, documentation, or boilerplate."#
    )
}

/// Build the first user message, seeded with the repository layout.
pub fn build_initial_message(repo_tree: &str) -> String {
    format!(
        "Here is the current repository structure:\n\n{repo_tree}\n\n\
         Please implement the ticket described in the system prompt. Start by exploring the \
         codebase to understand its structure, then make the necessary changes."
    )
}

/// Render the workspace as a box-drawing tree, `max_depth` levels deep.
pub fn repo_tree(root: &Path, max_depth: usize) -> String {
    let mut out = String::new();
    render_dir(root, "", 0, max_depth, &mut out);
    if out.is_empty() {
        "(empty repository)".to_string()
    } else {
        out
    }
}

fn render_dir(dir: &Path, prefix: &str, depth: usize, max_depth: usize, out: &mut String) {
    if depth > max_depth {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    let mut visible: Vec<(String, bool)> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || HIDDEN_NAMES.contains(&name.as_str()) {
                return None;
            }
            let is_dir = e.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
            Some((name, is_dir))
        })
        .collect();
    visible.sort();

    let count = visible.len();
    for (i, (name, is_dir)) in visible.into_iter().enumerate() {
        let last = i + 1 == count;
        let connector = if last { "└── " } else { "├── " };

        if is_dir {
            let _ = writeln!(out, "{prefix}{connector}{name}/");
            let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
            render_dir(&dir.join(&name), &child_prefix, depth + 1, max_depth, out);
        } else {
            let _ = writeln!(out, "{prefix}{connector}{name}");
        }
    }
}
