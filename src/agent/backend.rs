//! Chat-model backend seam.
//!
//! The conversation loop talks to the model through `ChatBackend`, so tests
//! can script turns and alternative providers can slot in behind the same
//! interface.

use super::transcript::{ToolCall, Transcript};
use crate::config::Settings;
use crate::error::{Result, TetherError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionTool, ChatCompletionToolChoiceOption, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::debug;

/// One assistant response: optional text plus zero or more tool calls.
#[derive(Debug, Clone, Default)]
pub struct AssistantTurn {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

/// A chat-completions provider: full transcript and catalog in, one
/// assistant turn out.
#[async_trait]
pub trait ChatBackend {
    async fn complete(
        &self,
        transcript: &Transcript,
        tools: &[ChatCompletionTool],
    ) -> Result<AssistantTurn>;
}

/// `ChatBackend` implementation over the OpenAI chat-completions API.
pub struct OpenAiBackend {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    system_prompt: String,
}

impl OpenAiBackend {
    /// Create a backend from settings.
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: create_client(settings),
            model: settings.openai.model.clone(),
            system_prompt: settings.agent.system_prompt.clone(),
        }
    }

    /// Override the model name.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(
        &self,
        transcript: &Transcript,
        tools: &[ChatCompletionTool],
    ) -> Result<AssistantTurn> {
        let messages = transcript.to_request_messages(Some(&self.system_prompt))?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.model).messages(messages);
        if !tools.is_empty() {
            builder
                .tools(tools.to_vec())
                .tool_choice(ChatCompletionToolChoiceOption::Auto);
        }
        let request = builder
            .build()
            .map_err(|e| TetherError::Agent(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| TetherError::OpenAI(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| TetherError::Agent("No response from model".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|call| ToolCall {
                id: call.id.clone(),
                name: call.function.name.clone(),
                arguments: call.function.arguments.clone(),
            })
            .collect::<Vec<_>>();

        debug!(
            "Model turn: {} tool calls, text present: {}",
            tool_calls.len(),
            choice.message.content.is_some()
        );

        Ok(AssistantTurn {
            text: choice.message.content.clone(),
            tool_calls,
        })
    }
}
