//! Pre-flight checks before connecting anywhere.
//!
//! Validates required configuration before spawning the server or touching
//! the network, so failures happen up front with a clear message.

use crate::error::{Result, TetherError};

/// Run pre-flight checks.
pub fn check() -> Result<()> {
    check_api_key()
}

/// Check if the OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(TetherError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(TetherError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}
