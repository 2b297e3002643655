//! Configuration settings for Tether.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default system prompt sent ahead of every conversation.
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant with access to external tools. \
Use the available tools when they help answer the user's question, \
then provide a clear final answer.";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub agent: AgentSettings,
    pub openai: OpenAISettings,
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Maximum model turns per query before giving up.
    pub max_turns: usize,
    /// System prompt sent ahead of the transcript.
    pub system_prompt: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_turns: 15,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// OpenAI API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAISettings {
    /// Chat model used for the conversation loop.
    pub model: String,
    /// Request timeout in seconds for API calls.
    pub request_timeout_seconds: u64,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            request_timeout_seconds: 300,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tether")
            .join("config.toml")
    }
}
