//! Message types for otto's conversation transcript.
//!
//! Provides the [`Transcript`] owned by the agent, the [`Message`] variants it
//! holds, and the [`ToolInvocation`] / [`ToolResult`] pair exchanged between
//! the accumulator, the tool registry and the feedback path.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Identifier used to match the result to this call.
    pub id: String,
    /// Name of the operation to invoke. Empty when the model never sent one.
    pub name: String,
    /// Raw argument text exactly as streamed (a JSON document, unvalidated).
    pub arguments: String,
}

impl ToolInvocation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parses the argument text into a key-value bag.
    ///
    /// Blank text, invalid JSON, or a JSON value that is not an object all
    /// yield an empty map rather than an error.
    pub fn parsed_arguments(&self) -> Map<String, Value> {
        if self.arguments.trim().is_empty() {
            return Map::new();
        }
        match serde_json::from_str::<Value>(&self.arguments) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => {
                tracing::warn!(call = %self.id, error = %e, "unparseable tool arguments, using empty set");
                Map::new()
            }
        }
    }
}

/// How a tool dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
    /// The registry has no operation with the requested name.
    UnknownOperation,
}

/// Which layer produced a [`ToolResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Registry,
    /// Synthetic corrective message from the unknown-tool feedback path.
    Feedback,
}

/// The result of one tool dispatch, ready to append to the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub name: String,
    pub outcome: Outcome,
    pub source: ResultSource,
    /// JSON object sent to the model; always carries `"ok"`.
    pub payload: Value,
}

impl ToolResult {
    pub fn is_ok(&self) -> bool {
        self.outcome == Outcome::Success
    }

    pub fn is_unknown_operation(&self) -> bool {
        self.outcome == Outcome::UnknownOperation
    }

    /// The payload serialized as the content string of a tool message.
    pub fn content(&self) -> String {
        self.payload.to_string()
    }
}

/// A single message in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolInvocation>,
    },
    ToolResult(ToolResult),
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Message::System { content: text.into() }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Message::User { content: text.into() }
    }

    pub fn assistant(text: impl Into<String>, tool_calls: Vec<ToolInvocation>) -> Self {
        Message::Assistant {
            content: text.into(),
            tool_calls,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Message::System { .. } => Role::System,
            Message::User { .. } => Role::User,
            Message::Assistant { .. } => Role::Assistant,
            Message::ToolResult(_) => Role::Tool,
        }
    }
}

/// The role of a message sender in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TranscriptError {
    #[error("tool result for call '{0}' does not answer the latest assistant message")]
    UnmatchedCallId(String),
}

/// Ordered, append-only conversation history.
///
/// The first message is always the system prompt. There is no way to remove
/// or reorder messages.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    pub fn push_assistant(&mut self, text: impl Into<String>, tool_calls: Vec<ToolInvocation>) {
        self.messages.push(Message::assistant(text, tool_calls));
    }

    /// Appends a tool result.
    ///
    /// Registry results must answer a call of the most recent assistant
    /// message; only tool results may sit between that message and this one.
    /// Feedback results carry a synthesized id and skip the check.
    pub fn push_tool_result(&mut self, result: ToolResult) -> Result<(), TranscriptError> {
        if result.source == ResultSource::Registry && !self.answers_latest_assistant(&result.call_id) {
            return Err(TranscriptError::UnmatchedCallId(result.call_id));
        }
        self.messages.push(Message::ToolResult(result));
        Ok(())
    }

    fn answers_latest_assistant(&self, call_id: &str) -> bool {
        for message in self.messages.iter().rev() {
            match message {
                Message::ToolResult(_) => continue,
                Message::Assistant { tool_calls, .. } => {
                    return tool_calls.iter().any(|c| c.id == call_id);
                }
                _ => return false,
            }
        }
        false
    }
}
