//! Tether CLI entry point.

use anyhow::Result;
use clap::Parser;
use tether::agent::{Agent, OpenAiBackend};
use tether::catalog::to_chat_tools;
use tether::cli::{chat, preflight, Cli, Output};
use tether::config::Settings;
use tether::mcp::McpSession;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("tether={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Fail fast on missing credentials, before any connection attempt
    if let Err(e) = preflight::check() {
        Output::error(&format!("{}", e));
        std::process::exit(1);
    }

    let mut backend = OpenAiBackend::new(&settings);
    if let Some(model) = &cli.model {
        backend = backend.with_model(model);
    }

    let mut session = match McpSession::connect(&cli.server).await {
        Ok(session) => session,
        Err(e) => {
            Output::error(&format!("Failed to connect to MCP server: {}", e));
            std::process::exit(1);
        }
    };

    let catalog = to_chat_tools(session.tools());
    let agent = Agent::new(backend, catalog, settings.agent.max_turns);

    // Teardown must run whether or not the chat loop failed.
    let result = chat::run_chat(&agent, &mut session).await;
    let closed = session.close().await;

    result?;
    closed?;
    Ok(())
}
