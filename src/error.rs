//! Error types for Tether.

use thiserror::Error;

/// Library-level error type for Tether operations.
#[derive(Error, Debug)]
pub enum TetherError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("MCP transport error: {0}")]
    Transport(String),

    #[error("MCP protocol error: {0}")]
    Protocol(String),

    #[error("Tool call failed: {0}")]
    ToolCall(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Agent error: {0}")]
    Agent(String),
}

/// Result type alias for Tether operations.
pub type Result<T> = std::result::Result<T, TetherError>;
