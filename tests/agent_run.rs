use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use ticketflow::agent::context::{build_initial_message, build_system_prompt, repo_tree};
use ticketflow::agent::{
    AgentLoop, ChatRequest, ChatResponse, ContentBlock, LlmClient, Role, RunOutcome, StopReason,
};
use ticketflow::tools::{Sandbox, ToolRunner};

struct ScriptedClient {
    replies: Mutex<VecDeque<ChatResponse>>,
    seen: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    fn new(replies: Vec<ChatResponse>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn chat(&self, request: &ChatRequest) -> ticketflow::Result<ChatResponse> {
        self.seen.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ticketflow::Error::Llm("script exhausted".to_string()))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

fn tool_call(id: &str, name: &str, input: serde_json::Value) -> ChatResponse {
    ChatResponse {
        content: vec![ContentBlock::tool_use(id, name, input)],
        stop_reason: StopReason::ToolUse,
    }
}

#[tokio::test]
async fn implements_ticket_end_to_end() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join("src")).unwrap();
    std::fs::write(tmp.path().join("src/greet.txt"), "hello\n").unwrap();

    let client = ScriptedClient::new(vec![
        tool_call("t1", "search_code", json!({"pattern": "hello"})),
        tool_call(
            "t2",
            "edit_file",
            json!({"path": "src/greet.txt", "old_string": "hello", "new_string": "hi"}),
        ),
        tool_call("t3", "write_file", json!({"path": "docs/NOTES.md", "content": "x"})),
        tool_call("t4", "edit_file", json!({"path": "src/greet.txt", "old_string": "hi", "new_string": "hey"})),
        ChatResponse::text("Renamed the greeting."),
    ]);

    let runner = ToolRunner::new_with_defaults(Sandbox::new(tmp.path()).unwrap());
    let agent = AgentLoop::new(client, runner, 10);

    let system = build_system_prompt("PROJ-7", "Shorter greeting", "Use hey");
    let initial = build_initial_message(&repo_tree(tmp.path(), 3));
    assert!(initial.contains("greet.txt"));

    let result = agent.run(&system, &initial).await.unwrap();

    assert_eq!(result.outcome, RunOutcome::Completed { turns: 5 });
    assert_eq!(result.summary, "Renamed the greeting.");

    let mut files = result.files_changed.clone();
    files.sort();
    assert_eq!(files, vec!["docs/NOTES.md".to_string(), "src/greet.txt".to_string()]);

    assert_eq!(std::fs::read_to_string(tmp.path().join("src/greet.txt")).unwrap(), "hey\n");
    assert_eq!(std::fs::read_to_string(tmp.path().join("docs/NOTES.md")).unwrap(), "x");
}

#[tokio::test]
async fn escape_attempts_become_tool_errors() {
    let tmp = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    let target = outside.path().join("pwned.txt");

    let client = ScriptedClient::new(vec![
        tool_call(
            "t1",
            "write_file",
            json!({"path": target.to_string_lossy(), "content": "x"}),
        ),
        ChatResponse::text("Could not write there."),
    ]);

    let runner = ToolRunner::new_with_defaults(Sandbox::new(tmp.path()).unwrap());
    let agent = AgentLoop::new(client, runner, 5);

    let result = agent.run("sys", "go").await.unwrap();
    assert!(result.files_changed.is_empty());
    assert!(!target.exists());

    let seen = agent_requests(&agent);
    let feedback = &seen[1].messages[2];
    assert_eq!(feedback.role, Role::User);
    match &feedback.content[0] {
        ContentBlock::ToolResult { tool_use_id, content, is_error } => {
            assert_eq!(tool_use_id, "t1");
            assert!(*is_error);
            assert!(content.contains("outside the workspace"));
        }
        other => panic!("expected tool result, got {other:?}"),
    }
}

#[tokio::test]
async fn backend_failure_fails_the_run() {
    let tmp = TempDir::new().unwrap();
    let runner = ToolRunner::new_with_defaults(Sandbox::new(tmp.path()).unwrap());
    let agent = AgentLoop::new(ScriptedClient::new(vec![]), runner, 5);

    let err = agent.run("sys", "go").await.unwrap_err();
    assert!(err.to_string().contains("script exhausted"));
}

fn agent_requests(agent: &AgentLoop<ScriptedClient>) -> Vec<ChatRequest> {
    agent.client().seen.lock().unwrap().clone()
}
