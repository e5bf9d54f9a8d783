//! Error types for ticketflow

use thiserror::Error;

/// Result type alias for ticketflow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ticketflow
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("{0}")]
    Tool(String),

    #[error("path {0:?} is outside the workspace")]
    OutsideWorkspace(String),

    #[error("Command timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Run cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}
