//! The conversation loop.
//!
//! Drives the model until it produces a tool-call-free answer. Every
//! assistant turn is appended to the transcript before any of its tool calls
//! run, and each call's result is appended in the order the calls were
//! issued. Tool execution failures become `{"error": ...}` result payloads
//! for the model to react to; everything else aborts the query.

use super::backend::ChatBackend;
use super::transcript::{ToolCall, Transcript};
use crate::error::{Result, TetherError};
use crate::mcp::content::{normalize, ToolPayload};
use async_openai::types::ChatCompletionTool;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Executes tool calls on behalf of the loop. Implemented by the MCP session
/// and by test doubles.
#[async_trait]
pub trait ToolExecutor {
    async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<ToolPayload>;
}

/// Agent driving one conversation at a time against a tool catalog.
pub struct Agent<B: ChatBackend> {
    backend: B,
    catalog: Vec<ChatCompletionTool>,
    max_turns: usize,
}

/// Result of a processed query.
#[derive(Debug)]
pub struct QueryOutcome {
    /// The model's final answer. Empty if the model produced neither text
    /// nor tool calls.
    pub answer: String,
    /// Full transcript of the query, including tool calls and results.
    pub transcript: Transcript,
    /// Number of model turns used.
    pub turns: usize,
}

impl<B: ChatBackend> Agent<B> {
    pub fn new(backend: B, catalog: Vec<ChatCompletionTool>, max_turns: usize) -> Self {
        Self {
            backend,
            catalog,
            max_turns,
        }
    }

    /// Run one query to completion.
    pub async fn process_query<E>(&self, executor: &mut E, query: &str) -> Result<QueryOutcome>
    where
        E: ToolExecutor + Send + ?Sized,
    {
        let mut transcript = Transcript::new(query);
        let mut turns = 0;

        loop {
            turns += 1;
            if turns > self.max_turns {
                return Err(TetherError::Agent(format!(
                    "exceeded maximum turns ({})",
                    self.max_turns
                )));
            }

            debug!("Model turn {} of {}", turns, self.max_turns);

            let turn = self.backend.complete(&transcript, &self.catalog).await?;

            // The assistant turn goes into the transcript before any tool
            // runs: the API requires the requesting message to precede its
            // results in transcript order.
            transcript.push_assistant(turn.text.clone(), turn.tool_calls.clone());

            if turn.tool_calls.is_empty() {
                let answer = turn.text.unwrap_or_default();
                if answer.is_empty() {
                    warn!("Model returned neither text nor tool calls");
                }
                return Ok(QueryOutcome {
                    answer,
                    transcript,
                    turns,
                });
            }

            for call in &turn.tool_calls {
                let payload = self.execute_call(executor, call).await?;
                transcript.push_tool_result(call.id.clone(), call.name.clone(), payload);
            }
        }
    }

    /// Execute one tool call, containing execution failures as data.
    ///
    /// Malformed argument JSON from the model is fatal for the query:
    /// dropping the call silently would desynchronize the call/result
    /// pairing the API requires.
    async fn execute_call<E>(&self, executor: &mut E, call: &ToolCall) -> Result<Value>
    where
        E: ToolExecutor + Send + ?Sized,
    {
        let arguments: Value = serde_json::from_str(&call.arguments).map_err(|e| {
            TetherError::Agent(format!(
                "invalid arguments for tool '{}': {}",
                call.name, e
            ))
        })?;

        info!("Executing tool '{}' with args: {}", call.name, arguments);

        match executor.call_tool(&call.name, arguments).await {
            Ok(payload) => Ok(normalize(&payload)),
            Err(e) => {
                warn!("Tool '{}' failed: {}", call.name, e);
                Ok(json!({ "error": failure_message(&e) }))
            }
        }
    }
}

/// The message handed back to the model for a failed call. The remote
/// error text, without the local error-type prefix.
fn failure_message(error: &TetherError) -> String {
    match error {
        TetherError::ToolCall(msg)
        | TetherError::Transport(msg)
        | TetherError::Protocol(msg) => msg.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::backend::AssistantTurn;
    use crate::agent::transcript::Message;
    use crate::catalog::to_chat_tools;
    use crate::mcp::protocol::ToolDescriptor;
    use std::sync::Mutex;

    /// Backend scripted with a fixed sequence of assistant turns.
    struct ScriptedBackend {
        turns: Mutex<Vec<AssistantTurn>>,
    }

    impl ScriptedBackend {
        fn new(turns: Vec<AssistantTurn>) -> Self {
            Self {
                turns: Mutex::new(turns),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn complete(
            &self,
            _transcript: &Transcript,
            _tools: &[ChatCompletionTool],
        ) -> Result<AssistantTurn> {
            let mut turns = self.turns.lock().unwrap();
            if turns.is_empty() {
                return Err(TetherError::Agent("script exhausted".to_string()));
            }
            Ok(turns.remove(0))
        }
    }

    /// Executor that answers per tool name and records the call order.
    struct FakeExecutor {
        calls: Vec<String>,
    }

    impl FakeExecutor {
        fn new() -> Self {
            Self { calls: Vec::new() }
        }
    }

    #[async_trait]
    impl ToolExecutor for FakeExecutor {
        async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<ToolPayload> {
            self.calls.push(name.to_string());
            match name {
                "echo" => {
                    let text = arguments["text"].as_str().unwrap_or_default().to_string();
                    Ok(serde_json::from_value(json!({"type": "text", "text": text})).unwrap())
                }
                "fail_tool" => Err(TetherError::ToolCall("disk full".to_string())),
                other => Err(TetherError::ToolCall(format!("unknown tool: {}", other))),
            }
        }
    }

    fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    fn text_turn(text: &str) -> AssistantTurn {
        AssistantTurn {
            text: Some(text.to_string()),
            tool_calls: Vec::new(),
        }
    }

    fn calls_turn(calls: Vec<ToolCall>) -> AssistantTurn {
        AssistantTurn {
            text: None,
            tool_calls: calls,
        }
    }

    fn echo_catalog() -> Vec<ChatCompletionTool> {
        to_chat_tools(&[ToolDescriptor {
            name: "echo".to_string(),
            description: "Echo text back".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"]
            }),
        }])
    }

    /// Every tool result must pair with a call in the nearest preceding
    /// assistant message, with no duplicate result ids in between.
    fn assert_pairing(transcript: &Transcript) {
        let messages = transcript.messages();
        for (i, message) in messages.iter().enumerate() {
            let Message::ToolResult { call_id, .. } = message else {
                continue;
            };

            let assistant_index = messages[..i]
                .iter()
                .rposition(|m| matches!(m, Message::Assistant { .. }))
                .expect("tool result with no preceding assistant message");

            let Message::Assistant { tool_calls, .. } = &messages[assistant_index] else {
                unreachable!()
            };
            assert!(
                tool_calls.iter().any(|c| &c.id == call_id),
                "result '{}' has no matching call",
                call_id
            );

            for m in &messages[assistant_index + 1..i] {
                if let Message::ToolResult { call_id: other, .. } = m {
                    assert_ne!(other, call_id, "duplicate result id '{}'", call_id);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_scenario_echo_then_done() {
        let backend = ScriptedBackend::new(vec![
            calls_turn(vec![tool_call("c1", "echo", r#"{"text": "hi"}"#)]),
            text_turn("done"),
        ]);
        let agent = Agent::new(backend, echo_catalog(), 15);
        let mut executor = FakeExecutor::new();

        let outcome = agent.process_query(&mut executor, "say hi").await.unwrap();

        assert_eq!(outcome.answer, "done");
        assert_eq!(outcome.turns, 2);
        assert_eq!(executor.calls, ["echo"]);
        assert_pairing(&outcome.transcript);

        let result = outcome
            .transcript
            .messages()
            .iter()
            .find_map(|m| match m {
                Message::ToolResult { payload, .. } => Some(payload.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(result, json!("hi"));
    }

    #[tokio::test]
    async fn test_scenario_tool_failure_is_contained() {
        let backend = ScriptedBackend::new(vec![
            calls_turn(vec![tool_call("c1", "fail_tool", "{}")]),
            text_turn("sorry about that"),
        ]);
        let agent = Agent::new(backend, Vec::new(), 15);
        let mut executor = FakeExecutor::new();

        let outcome = agent.process_query(&mut executor, "break").await.unwrap();

        assert_eq!(outcome.answer, "sorry about that");
        let results: Vec<_> = outcome
            .transcript
            .messages()
            .iter()
            .filter_map(|m| match m {
                Message::ToolResult { call_id, payload, .. } => Some((call_id, payload)),
                _ => None,
            })
            .collect();
        assert_eq!(results.len(), 1);
        assert_eq!(*results[0].0, "c1");
        assert_eq!(*results[0].1, json!({"error": "disk full"}));
    }

    #[tokio::test]
    async fn test_scenario_two_calls_in_order() {
        let backend = ScriptedBackend::new(vec![
            calls_turn(vec![
                tool_call("c1", "echo", r#"{"text": "one"}"#),
                tool_call("c2", "echo", r#"{"text": "two"}"#),
            ]),
            text_turn("both done"),
        ]);
        let agent = Agent::new(backend, echo_catalog(), 15);
        let mut executor = FakeExecutor::new();

        let outcome = agent.process_query(&mut executor, "twice").await.unwrap();

        let result_ids: Vec<_> = outcome
            .transcript
            .messages()
            .iter()
            .filter_map(|m| match m {
                Message::ToolResult { call_id, .. } => Some(call_id.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(result_ids, ["c1", "c2"]);
        assert_pairing(&outcome.transcript);
    }

    #[tokio::test]
    async fn test_terminates_without_tool_calls() {
        let backend = ScriptedBackend::new(vec![text_turn("just an answer")]);
        let agent = Agent::new(backend, Vec::new(), 15);
        let mut executor = FakeExecutor::new();

        let outcome = agent.process_query(&mut executor, "q").await.unwrap();
        assert_eq!(outcome.answer, "just an answer");
        assert_eq!(outcome.turns, 1);
        assert!(executor.calls.is_empty());
    }

    #[tokio::test]
    async fn test_empty_turn_returns_empty_answer() {
        let backend = ScriptedBackend::new(vec![AssistantTurn::default()]);
        let agent = Agent::new(backend, Vec::new(), 15);
        let mut executor = FakeExecutor::new();

        let outcome = agent.process_query(&mut executor, "q").await.unwrap();
        assert_eq!(outcome.answer, "");
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_error_payload() {
        let backend = ScriptedBackend::new(vec![
            calls_turn(vec![tool_call("c1", "nonexistent", "{}")]),
            text_turn("ok"),
        ]);
        let agent = Agent::new(backend, Vec::new(), 15);
        let mut executor = FakeExecutor::new();

        let outcome = agent.process_query(&mut executor, "q").await.unwrap();
        let payload = outcome
            .transcript
            .messages()
            .iter()
            .find_map(|m| match m {
                Message::ToolResult { payload, .. } => Some(payload.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(payload, json!({"error": "unknown tool: nonexistent"}));
    }

    #[tokio::test]
    async fn test_malformed_arguments_abort_query() {
        let backend = ScriptedBackend::new(vec![calls_turn(vec![tool_call(
            "c1",
            "echo",
            "{not json",
        )])]);
        let agent = Agent::new(backend, echo_catalog(), 15);
        let mut executor = FakeExecutor::new();

        let err = agent.process_query(&mut executor, "q").await.unwrap_err();
        assert!(matches!(err, TetherError::Agent(_)));
        assert!(executor.calls.is_empty());
    }

    #[tokio::test]
    async fn test_max_turns_guard() {
        // A model that asks for the same tool forever.
        struct LoopingBackend;

        #[async_trait]
        impl ChatBackend for LoopingBackend {
            async fn complete(
                &self,
                _transcript: &Transcript,
                _tools: &[ChatCompletionTool],
            ) -> Result<AssistantTurn> {
                Ok(AssistantTurn {
                    text: None,
                    tool_calls: vec![ToolCall {
                        id: "c1".to_string(),
                        name: "echo".to_string(),
                        arguments: r#"{"text": "again"}"#.to_string(),
                    }],
                })
            }
        }

        let agent = Agent::new(LoopingBackend, echo_catalog(), 3);
        let mut executor = FakeExecutor::new();

        let err = agent.process_query(&mut executor, "q").await.unwrap_err();
        assert!(err.to_string().contains("maximum turns"));
        assert_eq!(executor.calls.len(), 3);
    }
}
