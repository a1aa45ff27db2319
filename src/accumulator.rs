//! Reconstruction of tool invocations from a streamed model response.
//!
//! The model sends text and tool calls in fragments. Call fragments are
//! addressed by a position index; an id and name usually arrive once, early,
//! while the argument JSON arrives as many partial strings. [`Accumulator`]
//! collects fragments per index and [`Accumulator::finish`] emits the
//! completed calls in ascending index order.

use std::collections::BTreeMap;
use std::time::Duration;

use futures::StreamExt;

use crate::constants::SYNTHETIC_CALL_ID_PREFIX;
use crate::message::ToolInvocation;
use crate::output::Renderer;
use crate::provider::{CallFragment, EventStream, StreamError, StreamEvent};

/// In-progress state for one call index.
#[derive(Debug, Default)]
struct PartialCall {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

/// The finalized product of one streamed step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutput {
    pub text: String,
    pub calls: Vec<ToolInvocation>,
}

/// Folds [`StreamEvent`]s into text and tool invocations.
#[derive(Debug, Default)]
pub struct Accumulator {
    text: String,
    partials: BTreeMap<u32, PartialCall>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event.
    pub fn push(&mut self, event: &StreamEvent) {
        if let Some(text) = &event.text {
            self.text.push_str(text);
        }
        for fragment in &event.calls {
            self.apply(fragment);
        }
    }

    fn apply(&mut self, fragment: &CallFragment) {
        let partial = self.partials.entry(fragment.index).or_default();
        if let Some(id) = fragment.id.as_deref().filter(|id| !id.is_empty()) {
            partial.id = Some(id.to_string());
        }
        if let Some(name) = fragment.name.as_deref().filter(|name| !name.is_empty()) {
            partial.name = Some(name.to_string());
        }
        if let Some(arguments) = &fragment.arguments {
            partial.arguments.push_str(arguments);
        }
    }

    /// Finalizes the step.
    ///
    /// Calls are emitted in ascending index order. A call without an id gets
    /// `tool_<index>`; a call without a name keeps an empty name so the
    /// registry reports it as unknown instead of it vanishing.
    pub fn finish(self) -> StepOutput {
        let calls = self
            .partials
            .into_iter()
            .map(|(index, partial)| {
                ToolInvocation::new(
                    partial
                        .id
                        .unwrap_or_else(|| format!("{SYNTHETIC_CALL_ID_PREFIX}{index}")),
                    partial.name.unwrap_or_default(),
                    partial.arguments,
                )
            })
            .collect();
        StepOutput {
            text: self.text,
            calls,
        }
    }
}

/// Drains `stream` through an [`Accumulator`], mirroring text to `renderer`.
///
/// On a stream error, or when no event arrives within `idle`, the partially
/// accumulated state is dropped and the error returned; nothing from a
/// failed step is ever finalized.
pub async fn accumulate(
    mut stream: EventStream,
    renderer: &mut dyn Renderer,
    idle: Duration,
) -> Result<StepOutput, StreamError> {
    let mut accumulator = Accumulator::new();
    loop {
        let next = tokio::time::timeout(idle, stream.next())
            .await
            .map_err(|_| StreamError::Timeout(idle))?;
        let Some(event) = next else { break };
        let event = event?;
        if let Some(text) = &event.text {
            renderer.render_token(text);
        }
        accumulator.push(&event);
    }
    Ok(accumulator.finish())
}
