//! The model-stream source contract.
//!
//! A [`ModelSource`] turns one [`StepRequest`] into an ordered stream of
//! [`StreamEvent`]s. Each event may carry a text fragment and any number of
//! tool-call fragments addressed by a small integer index.

use futures::stream::BoxStream;
use std::time::Duration;
use thiserror::Error;

use crate::message::Message;
use crate::tools::ToolSpec;

/// Whether the model may decide on its own to call a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolChoice {
    Auto,
}

impl ToolChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolChoice::Auto => "auto",
        }
    }
}

/// Everything a source needs to produce one step.
#[derive(Debug, Clone, Copy)]
pub struct StepRequest<'a> {
    /// Full transcript; the first message is the system prompt.
    pub messages: &'a [Message],
    pub tools: &'a [ToolSpec],
    pub tool_choice: ToolChoice,
}

/// A piece of one tool call, addressed by its position index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallFragment {
    pub index: u32,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// One streamed event from the model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamEvent {
    pub text: Option<String>,
    pub calls: Vec<CallFragment>,
}

#[cfg(test)]
impl StreamEvent {
    pub fn text(fragment: impl Into<String>) -> Self {
        Self {
            text: Some(fragment.into()),
            calls: Vec::new(),
        }
    }

    pub fn call(fragment: CallFragment) -> Self {
        Self {
            text: None,
            calls: vec![fragment],
        }
    }
}

/// Failures while requesting or consuming a model stream.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed stream chunk: {0}")]
    Decode(String),
    #[error("model stream went quiet for {0:?}")]
    Timeout(Duration),
}

pub type EventStream = BoxStream<'static, Result<StreamEvent, StreamError>>;

/// A source of streamed model output.
#[async_trait::async_trait]
pub trait ModelSource: Send + Sync {
    /// Opens the stream for one step.
    async fn stream(&self, request: StepRequest<'_>) -> Result<EventStream, StreamError>;
}
