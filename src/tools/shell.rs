//! Shell tool - execute commands in the workspace

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::warn;

use super::{parse_args, Sandbox, Tool, ToolOutput};
use crate::error::Error;
use crate::Result;

/// Captured output beyond this many characters is cut off.
pub const MAX_OUTPUT_CHARS: usize = 50_000;

/// Appended when output is cut off.
pub const TRUNCATION_SUFFIX: &str = "\n... output truncated";

/// Wall-clock limit for a single command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Deserialize)]
struct CommandArgs {
    command: String,
}

/// Execute shell commands
pub struct RunCommandTool {
    sandbox: Sandbox,
    timeout: Duration,
}

impl RunCommandTool {
    pub fn new(sandbox: Sandbox) -> Self {
        Self {
            sandbox,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the command deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, command: &str) -> Result<(String, std::process::ExitStatus)> {
        // stderr is folded into stdout so the model sees both in emission order.
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg("eval \"$1\" 2>&1")
            .arg("sh")
            .arg(command)
            .current_dir(self.sandbox.root())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::Tool(format!("Failed to execute command: {}", e)))?;
        let pid = child.id();
        let stdout = child.stdout.take();

        // Background jobs keep the pipe open, so the read shares the deadline.
        let finished = tokio::time::timeout(self.timeout, async {
            let output = read_all(stdout).await;
            let status = child.wait().await?;
            Ok::<_, Error>((output, status))
        })
        .await;

        match finished {
            Ok(result) => {
                let (output, status) = result?;
                Ok((truncate_output(output), status))
            }
            Err(_) => {
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed out command: {}", e);
                }
                Err(Error::Timeout(self.timeout))
            }
        }
    }
}

/// SIGKILL every process in the group led by `pid`.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: killpg only sends a signal; no memory is shared with the callee.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        warn!(
            "Failed to kill process group {}: {}",
            pgid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

async fn read_all<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Cap output at [`MAX_OUTPUT_CHARS`] characters, marking the cut.
fn truncate_output(output: String) -> String {
    match output.char_indices().nth(MAX_OUTPUT_CHARS) {
        Some((byte_idx, _)) => {
            let mut cut = output;
            cut.truncate(byte_idx);
            cut.push_str(TRUNCATION_SUFFIX);
            cut
        }
        None => output,
    }
}

#[async_trait]
impl Tool for RunCommandTool {
    fn name(&self) -> &str { "run_command" }
    fn description(&self) -> &str {
        "Execute a shell command in the repository directory. Use for running tests, linters, or build commands. Commands are sandboxed to the repository."
    }

    fn parameters(&self) -> Value {
        json!({
            "command": {
                "type": "string",
                "description": "The shell command to execute."
            }
        })
    }

    fn required(&self) -> &[&str] { &["command"] }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let args: CommandArgs = parse_args(self.name(), params)?;
        let (output, status) = self.run(&args.command).await?;

        if status.success() {
            Ok(ToolOutput::text(output))
        } else {
            Err(Error::Tool(format!("Command failed: {}\n{}", status, output)))
        }
    }
}
