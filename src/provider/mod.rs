//! Model-stream sources for otto.
//!
//! Defines the [`ModelSource`] contract the turn loop consumes and the
//! OpenAI-compatible implementation used at runtime.

mod client;
mod source;
mod sse;
mod wire;

pub use client::OpenAiSource;
pub use source::{
    CallFragment, EventStream, ModelSource, StepRequest, StreamError, StreamEvent, ToolChoice,
};
