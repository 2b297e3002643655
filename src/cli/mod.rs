//! CLI module for Tether.

pub mod chat;
mod output;
pub mod preflight;

pub use output::Output;

use clap::Parser;

/// Tether - MCP-to-LLM Tool Bridge
///
/// Launches an MCP server, advertises its tools to a chat model, and runs an
/// interactive tool-calling conversation.
#[derive(Parser, Debug)]
#[command(name = "tether")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// MCP server to launch: a .py or .js script, or an executable
    pub server: String,

    /// Chat model to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
