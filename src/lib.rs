//! Tether - MCP-to-LLM Tool Bridge
//!
//! A CLI agent that connects an OpenAI-compatible chat model to tools hosted
//! by an MCP (Model Context Protocol) server over stdio.
//!
//! # Overview
//!
//! Tether lets a chat model drive external tools:
//! - Launches an MCP server subprocess and discovers its tools
//! - Advertises the discovered tools to the model on every turn
//! - Executes requested tool calls and feeds results back into the
//!   conversation until the model produces a final answer
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `schema` - JSON-schema sanitization for the model API
//! - `catalog` - MCP tool descriptors to model tool declarations
//! - `mcp` - MCP session, stdio transport, and result normalization
//! - `agent` - Conversation loop and transcript bookkeeping
//! - `cli` - Command-line surface
//!
//! # Example
//!
//! ```rust,no_run
//! use tether::agent::{Agent, OpenAiBackend};
//! use tether::catalog::to_chat_tools;
//! use tether::config::Settings;
//! use tether::mcp::McpSession;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let mut session = McpSession::connect("server.py").await?;
//!     let catalog = to_chat_tools(session.tools());
//!
//!     let backend = OpenAiBackend::new(&settings);
//!     let agent = Agent::new(backend, catalog, settings.agent.max_turns);
//!     let outcome = agent.process_query(&mut session, "What tools do you have?").await?;
//!     println!("{}", outcome.answer);
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod mcp;
pub mod openai;
pub mod schema;

pub use error::{Result, TetherError};
