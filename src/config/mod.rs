//! Configuration module for Tether.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{AgentSettings, OpenAISettings, Settings};
