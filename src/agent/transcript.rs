//! Conversation transcript bookkeeping.
//!
//! The transcript is append-only for the duration of a query. Every tool
//! result immediately follows the assistant message that requested it, in
//! the order the calls were issued, and carries the originating call id.

use crate::error::{Result, TetherError};
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionToolType, FunctionCall,
};
use serde_json::Value;

/// A tool invocation requested by the model.
///
/// `arguments` is the raw JSON text as emitted by the model; it is parsed at
/// execution time and malformed JSON is a fatal error for the query.
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// One entry in the conversation transcript.
#[derive(Debug, Clone)]
pub enum Message {
    User {
        text: String,
    },
    Assistant {
        text: Option<String>,
        tool_calls: Vec<ToolCall>,
    },
    ToolResult {
        call_id: String,
        tool_name: String,
        payload: Value,
    },
}

/// Ordered message history for one query.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Start a transcript with the user's query.
    pub fn new(query: &str) -> Self {
        Self {
            messages: vec![Message::User {
                text: query.to_string(),
            }],
        }
    }

    /// Append an assistant turn, tool calls and all.
    pub fn push_assistant(&mut self, text: Option<String>, tool_calls: Vec<ToolCall>) {
        self.messages.push(Message::Assistant { text, tool_calls });
    }

    /// Append the result of a single tool call.
    pub fn push_tool_result(&mut self, call_id: String, tool_name: String, payload: Value) {
        self.messages.push(Message::ToolResult {
            call_id,
            tool_name,
            payload,
        });
    }

    /// All messages, in append order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Convert to chat-API request messages, with an optional system prompt
    /// sent ahead of the history. Tool-result payloads are serialized to
    /// text at this boundary.
    pub fn to_request_messages(
        &self,
        system_prompt: Option<&str>,
    ) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);

        if let Some(prompt) = system_prompt {
            out.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(prompt)
                    .build()
                    .map_err(|e| TetherError::Agent(e.to_string()))?
                    .into(),
            );
        }

        for message in &self.messages {
            match message {
                Message::User { text } => {
                    out.push(
                        ChatCompletionRequestUserMessageArgs::default()
                            .content(text.as_str())
                            .build()
                            .map_err(|e| TetherError::Agent(e.to_string()))?
                            .into(),
                    );
                }
                Message::Assistant { text, tool_calls } => {
                    let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
                    if let Some(text) = text {
                        builder.content(text.as_str());
                    }
                    if !tool_calls.is_empty() {
                        builder.tool_calls(
                            tool_calls
                                .iter()
                                .map(|call| ChatCompletionMessageToolCall {
                                    id: call.id.clone(),
                                    r#type: ChatCompletionToolType::Function,
                                    function: FunctionCall {
                                        name: call.name.clone(),
                                        arguments: call.arguments.clone(),
                                    },
                                })
                                .collect::<Vec<_>>(),
                        );
                    }
                    out.push(
                        builder
                            .build()
                            .map_err(|e| TetherError::Agent(e.to_string()))?
                            .into(),
                    );
                }
                Message::ToolResult {
                    call_id, payload, ..
                } => {
                    out.push(
                        ChatCompletionRequestToolMessageArgs::default()
                            .tool_call_id(call_id.as_str())
                            .content(serde_json::to_string(payload)?)
                            .build()
                            .map_err(|e| TetherError::Agent(e.to_string()))?
                            .into(),
                    );
                }
            }
        }

        Ok(out)
    }
}
