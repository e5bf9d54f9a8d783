//! Ticketflow CLI entry point

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use ticketflow::agent::context::{self, DEFAULT_TREE_DEPTH};
use ticketflow::agent::{AgentLoop, RunOutcome};
use ticketflow::config::Config;
use ticketflow::output::write_github_output;

#[derive(Parser)]
#[command(name = "ticketflow")]
#[command(about = "Implement a ticket in a repository with an LLM coding agent")]
#[command(version)]
struct Cli {
    /// Read configuration from a JSON file instead of INPUT_* variables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// LLM provider: claude, openai or gemini
    #[arg(long)]
    provider: Option<String>,

    /// Model name; defaults to the provider's default
    #[arg(long)]
    model: Option<String>,

    /// Repository to work in
    #[arg(short, long)]
    workspace: Option<PathBuf>,

    /// Maximum number of model turns
    #[arg(long)]
    max_turns: Option<usize>,

    /// Abort the whole run after this many seconds
    #[arg(long)]
    timeout: Option<u64>,
}

impl Cli {
    fn load_config(&self) -> ticketflow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::from_env()?,
        };

        if let Some(provider) = &self.provider {
            config.provider = provider.clone();
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(workspace) = &self.workspace {
            config.workspace = workspace.clone();
        }
        if let Some(max_turns) = self.max_turns {
            config.max_turns = max_turns;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    let cancel = CancellationToken::new();

    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\n{}", "Interrupted, stopping after the current step".yellow());
        on_interrupt.cancel();
    })
    .ok();

    if let Some(secs) = cli.timeout {
        let deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            tracing::warn!("Run deadline of {}s reached", secs);
            deadline.cancel();
        });
    }

    tracing::info!(
        "Starting agent: provider={}, model={}, ticket={}",
        config.provider,
        config.effective_model(),
        config.ticket_key
    );

    let agent = AgentLoop::from_config(&config)?;
    let system = context::build_system_prompt(
        &config.ticket_key,
        &config.ticket_title,
        &config.ticket_description,
    );
    let tree = context::repo_tree(&config.workspace, DEFAULT_TREE_DEPTH);
    let initial = context::build_initial_message(&tree);

    let result = agent.run_with_cancel(&system, &initial, &cancel).await?;

    match result.outcome {
        RunOutcome::Completed { turns } => {
            println!("{} after {} turns", "✓ Completed".green().bold(), turns)
        }
        RunOutcome::BudgetExhausted { turns } => {
            println!("{} after {} turns", "⚠ Turn budget exhausted".yellow().bold(), turns)
        }
    }
    println!("\n{}\n{}", "Summary:".bold(), result.summary);

    if result.files_changed.is_empty() {
        println!("\n{}", "No files changed".dimmed());
    } else {
        println!("\n{}", "Files changed:".bold());
        for path in &result.files_changed {
            println!("  {}", path.cyan());
        }
    }

    if let Some(path) = std::env::var_os("GITHUB_OUTPUT") {
        let path = PathBuf::from(path);
        for (name, value) in [
            ("files_changed", result.files_changed.join(",")),
            ("summary", result.summary.clone()),
        ] {
            if let Err(e) = write_github_output(&path, name, &value) {
                tracing::warn!("Failed to write output {}: {}", name, e);
            }
        }
    }

    Ok(())
}
