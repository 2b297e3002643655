//! MCP session lifecycle: connect, discover, call, tear down.

use super::content::{self, ToolPayload};
use super::protocol::{
    ClientInfo, InitializeParams, InitializeResult, ToolCallParams, ToolCallResult,
    ToolDescriptor, ToolsListResult, PROTOCOL_VERSION,
};
use super::transport::StdioTransport;
use crate::agent::ToolExecutor;
use crate::error::{Result, TetherError};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

const CLIENT_NAME: &str = "tether";
const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// An initialized connection to an MCP server, with its discovered tools.
///
/// The session owns the server subprocess. `close` must be called on every
/// exit path; the transport's `Drop` kills the child as a backstop if it is
/// skipped.
pub struct McpSession {
    transport: StdioTransport,
    tools: Vec<ToolDescriptor>,
    closed: bool,
}

impl McpSession {
    /// Spawn the server, perform the initialize handshake, and run one-time
    /// tool discovery.
    pub async fn connect(target: &str) -> Result<Self> {
        let mut transport = StdioTransport::spawn(target)?;

        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: json!({}),
            client_info: ClientInfo {
                name: CLIENT_NAME.to_string(),
                version: CLIENT_VERSION.to_string(),
            },
        };

        let raw = transport
            .request("initialize", Some(serde_json::to_value(params)?))
            .await?;
        let init: InitializeResult = serde_json::from_value(raw)
            .map_err(|e| TetherError::Protocol(format!("bad initialize result: {}", e)))?;

        if let Some(server) = &init.server_info {
            info!(
                "Connected to MCP server '{}' {} (protocol {})",
                server.name, server.version, init.protocol_version
            );
        } else {
            info!("Connected to MCP server (protocol {})", init.protocol_version);
        }

        transport.notify("notifications/initialized", None).await?;

        let raw = transport.request("tools/list", None).await?;
        let listed: ToolsListResult = serde_json::from_value(raw)
            .map_err(|e| TetherError::Protocol(format!("bad tools/list result: {}", e)))?;

        info!(
            "Discovered {} tools: {:?}",
            listed.tools.len(),
            listed.tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>()
        );

        Ok(Self {
            transport,
            tools: listed.tools,
            closed: false,
        })
    }

    /// The tool catalog discovered at connect time.
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Execute a tool on the server and return its raw result payload.
    ///
    /// A result flagged `isError` by the server is surfaced as an `Err`, so
    /// callers treat it like any other tool failure.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<ToolPayload> {
        debug!("Calling tool '{}' with args: {}", name, arguments);

        let params = ToolCallParams {
            name: name.to_string(),
            arguments,
        };

        let raw = self
            .transport
            .request("tools/call", Some(serde_json::to_value(params)?))
            .await?;
        let result: ToolCallResult = serde_json::from_value(raw)
            .map_err(|e| TetherError::Protocol(format!("bad tools/call result: {}", e)))?;

        if result.is_error == Some(true) {
            let text = content::to_text(&result.content);
            let message = if text.is_empty() || text == "null" {
                "tool reported an error".to_string()
            } else {
                text
            };
            return Err(TetherError::ToolCall(message));
        }

        Ok(result.content)
    }

    /// Release the transport and the server subprocess. Idempotent.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.transport.shutdown().await
    }
}

#[async_trait]
impl ToolExecutor for McpSession {
    async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<ToolPayload> {
        McpSession::call_tool(self, name, arguments).await
    }
}
