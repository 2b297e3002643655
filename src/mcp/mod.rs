//! MCP client: stdio transport, session lifecycle, and result normalization.

pub mod content;
pub mod protocol;
pub mod session;
pub mod transport;

pub use content::{normalize, ToolPayload};
pub use protocol::ToolDescriptor;
pub use session::McpSession;
