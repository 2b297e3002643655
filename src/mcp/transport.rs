//! Stdio transport for MCP servers.
//!
//! Spawns the server as a subprocess and speaks newline-delimited JSON-RPC
//! over its stdin/stdout. The server's stderr is inherited so its logs stay
//! visible without interfering with the protocol stream.

use super::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::error::{Result, TetherError};
use serde_json::Value;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

/// A line-oriented JSON-RPC connection to a spawned MCP server.
pub struct StdioTransport {
    child: Child,
    stdin: Option<ChildStdin>,
    lines: Lines<BufReader<ChildStdout>>,
    next_id: u64,
}

impl StdioTransport {
    /// Spawn the server process for the given target and wire up its pipes.
    pub fn spawn(target: &str) -> Result<Self> {
        let (program, args) = server_command(target);

        debug!("Spawning MCP server: {} {:?}", program, args);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| TetherError::Transport(format!("failed to spawn '{}': {}", target, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TetherError::Transport("server stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TetherError::Transport("server stdout not captured".to_string()))?;

        Ok(Self {
            child,
            stdin: Some(stdin),
            lines: BufReader::new(stdout).lines(),
            next_id: 0,
        })
    }

    /// Send a request and wait for the matching response.
    ///
    /// Lines that are not the awaited response (server notifications,
    /// unparseable output) are skipped with a warning. A JSON-RPC error
    /// response becomes a `Protocol` error.
    pub async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        self.next_id += 1;
        let id = self.next_id;

        self.send(&JsonRpcRequest::call(id, method, params)).await?;

        loop {
            let line = self
                .lines
                .next_line()
                .await?
                .ok_or_else(|| TetherError::Transport("server closed its stdout".to_string()))?;

            if line.is_empty() {
                continue;
            }

            let response: JsonRpcResponse = match serde_json::from_str(&line) {
                Ok(r) => r,
                Err(e) => {
                    warn!("Skipping unparseable server line: {}", e);
                    continue;
                }
            };

            match &response.id {
                Some(value) if value.as_u64() == Some(id) => {
                    if let Some(error) = response.error {
                        return Err(TetherError::Protocol(format!(
                            "{} failed: {} (code {})",
                            method, error.message, error.code
                        )));
                    }
                    return Ok(response.result.unwrap_or(Value::Null));
                }
                _ => {
                    debug!("Skipping message for another id during {}", method);
                }
            }
        }
    }

    /// Send a notification (no response expected).
    pub async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        self.send(&JsonRpcRequest::notification(method, params)).await
    }

    async fn send(&mut self, request: &JsonRpcRequest) -> Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| TetherError::Transport("transport already shut down".to_string()))?;

        let mut line = serde_json::to_string(request)?;
        line.push('\n');
        stdin.write_all(line.as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Tear the transport down: close the server's stdin, then reap the
    /// process. Releases in reverse order of acquisition.
    pub async fn shutdown(&mut self) -> Result<()> {
        // Dropping stdin sends EOF, the usual stop signal for stdio servers.
        self.stdin.take();
        // kill() also reaps the child; a no-op if it already exited on EOF.
        self.child.kill().await.ok();
        Ok(())
    }
}

impl Drop for StdioTransport {
    fn drop(&mut self) {
        // Backstop for exits that bypass shutdown(); kill is a no-op if the
        // child already exited.
        self.child.start_kill().ok();
    }
}

/// Pick the interpreter for a server target.
///
/// Python and Node scripts launch under their interpreters; anything else is
/// executed directly.
fn server_command(target: &str) -> (String, Vec<String>) {
    if target.ends_with(".py") {
        ("python".to_string(), vec![target.to_string()])
    } else if target.ends_with(".js") {
        ("node".to_string(), vec![target.to_string()])
    } else {
        (target.to_string(), Vec::new())
    }
}
