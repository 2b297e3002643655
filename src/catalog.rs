//! Converts discovered MCP tool descriptors into model tool declarations.

use crate::mcp::protocol::ToolDescriptor;
use crate::schema::sanitize_schema;
use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};

/// Build the chat-API tool catalog from MCP tool descriptors.
///
/// One declaration per descriptor, in catalog order, with the input schema
/// sanitized for the model API. Duplicate tool names are passed through
/// unchanged; the model API's own dispatch defines their behavior.
pub fn to_chat_tools(tools: &[ToolDescriptor]) -> Vec<ChatCompletionTool> {
    tools
        .iter()
        .map(|tool| ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                parameters: Some(sanitize_schema(&tool.input_schema)),
                strict: None,
            },
        })
        .collect()
}
