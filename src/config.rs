//! Configuration management
//!
//! A run is configured either from GitHub Actions style `INPUT_*` environment
//! variables or from a JSON file, then optionally overridden by CLI flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::agent::llm::{ProviderKind, ProviderRegistry};
use crate::error::Error;
use crate::Result;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// LLM provider: "claude", "openai" or "gemini" (or an alias)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API key for the selected provider
    #[serde(default)]
    pub api_key: String,

    /// Model to use; empty selects the provider's default
    #[serde(default)]
    pub model: String,

    /// Endpoint override, e.g. for a proxy
    #[serde(default)]
    pub api_base: Option<String>,

    #[serde(default)]
    pub ticket_key: String,

    #[serde(default)]
    pub ticket_title: String,

    #[serde(default)]
    pub ticket_description: String,

    /// Repository the agent works in
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,

    /// Turn budget for one run
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Output token limit sent with every request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_provider() -> String {
    "claude".to_string()
}

fn default_workspace() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_turns() -> usize {
    50
}

fn default_max_tokens() -> u32 {
    8192
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: String::new(),
            model: String::new(),
            api_base: None,
            ticket_key: String::new(),
            ticket_title: String::new(),
            ticket_description: String::new(),
            workspace: default_workspace(),
            max_turns: default_max_turns(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Action inputs are read as `INPUT_<NAME>`; the workspace comes from
    /// `GITHUB_WORKSPACE`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let input = |name: &str| get(&format!("INPUT_{}", name.to_uppercase()));
        let require = |name: &str| {
            input(name).ok_or_else(|| Error::Config(format!("Required input {} is not set", name)))
        };

        let mut config = Config {
            api_key: require("api_key")?,
            ticket_key: require("ticket_key")?,
            ticket_title: require("ticket_title")?,
            ticket_description: require("ticket_description")?,
            model: input("model").unwrap_or_default(),
            api_base: input("api_base"),
            ..Config::default()
        };

        if let Some(provider) = input("provider") {
            config.provider = provider;
        }
        if let Some(workspace) = get("GITHUB_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }
        if let Some(turns) = input("max_turns") {
            config.max_turns = turns
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("Invalid max_turns: {:?}", turns)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Config(format!("Config not found at {:?}", path)));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can start a run.
    pub fn validate(&self) -> Result<()> {
        if ProviderKind::parse(&self.provider).is_none() {
            return Err(Error::Config(format!(
                "Unknown provider {:?}; supported: {}",
                self.provider,
                ProviderRegistry::available().join(", ")
            )));
        }

        for (name, value) in [
            ("api_key", &self.api_key),
            ("ticket_key", &self.ticket_key),
            ("ticket_title", &self.ticket_title),
            ("ticket_description", &self.ticket_description),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("Required input {} is not set", name)));
            }
        }

        if self.max_turns == 0 {
            return Err(Error::Config("max_turns must be at least 1".to_string()));
        }
        Ok(())
    }

    /// The model that will actually be used.
    pub fn effective_model(&self) -> &str {
        match ProviderKind::parse(&self.provider) {
            Some(kind) if self.model.is_empty() => kind.default_model(),
            _ => &self.model,
        }
    }
}
