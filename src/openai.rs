//! OpenAI client configuration with sensible defaults.

use crate::config::Settings;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for OpenAI API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create an OpenAI client with the timeout from settings.
pub fn create_client(settings: &Settings) -> Client<OpenAIConfig> {
    create_client_with_timeout(Duration::from_secs(settings.openai.request_timeout_seconds))
}

/// Create an OpenAI client with a custom timeout.
///
/// Uses a 5-minute timeout by default to prevent hung API calls.
pub fn create_client_with_timeout(timeout: Duration) -> Client<OpenAIConfig> {
    let timeout = if timeout.is_zero() {
        Duration::from_secs(DEFAULT_TIMEOUT_SECS)
    } else {
        timeout
    };

    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client");

    Client::with_config(OpenAIConfig::default()).with_http_client(http_client)
}
