//! Agent module: conversation loop, transcript, and model backend.

mod backend;
mod runner;
mod transcript;

pub use backend::{AssistantTurn, ChatBackend, OpenAiBackend};
pub use runner::{Agent, QueryOutcome, ToolExecutor};
pub use transcript::{Message, ToolCall, Transcript};
