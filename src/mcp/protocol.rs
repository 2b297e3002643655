//! MCP protocol types (JSON-RPC 2.0), as seen from the client side.

use super::content::ToolPayload;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MCP protocol revision this client speaks.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC request. A request without an id is a notification.
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn call(id: u64, method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(Value::from(id)),
            method: method.to_string(),
            params,
        }
    }

    pub fn notification(method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: method.to_string(),
            params,
        }
    }
}

/// JSON-RPC response.
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// MCP initialize request params.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    pub capabilities: Value,
    pub client_info: ClientInfo,
}

#[derive(Debug, Serialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// MCP initialize response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    #[serde(default)]
    pub server_info: Option<ServerInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// A tool advertised by the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub input_schema: Value,
}

/// Result of a tools/list request.
#[derive(Debug, Deserialize)]
pub struct ToolsListResult {
    pub tools: Vec<ToolDescriptor>,
}

/// Params for a tools/call request.
#[derive(Debug, Serialize)]
pub struct ToolCallParams {
    pub name: String,
    pub arguments: Value,
}

/// Result of a tools/call request.
#[derive(Debug, Deserialize)]
pub struct ToolCallResult {
    #[serde(default)]
    pub content: ToolPayload,
    #[serde(rename = "isError", default)]
    pub is_error: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notification_has_no_id() {
        let req = JsonRpcRequest::notification("notifications/initialized", None);
        let encoded = serde_json::to_value(&req).unwrap();
        assert_eq!(
            encoded,
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"})
        );
    }

    #[test]
    fn test_tool_descriptor_defaults() {
        let tool: ToolDescriptor = serde_json::from_value(json!({"name": "echo"})).unwrap();
        assert_eq!(tool.name, "echo");
        assert!(tool.description.is_empty());
        assert!(tool.input_schema.is_null());
    }

    #[test]
    fn test_tool_call_result_error_flag() {
        let result: ToolCallResult = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "disk full"}],
            "isError": true
        }))
        .unwrap();
        assert_eq!(result.is_error, Some(true));
    }

    #[test]
    fn test_response_with_error() {
        let response: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc": "2.0", "id": 3, "error": {"code": -32601, "message": "Method not found"}}"#,
        )
        .unwrap();
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().code, -32601);
    }
}
