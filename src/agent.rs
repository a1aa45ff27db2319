//! The turn loop.
//!
//! One user prompt starts a turn. Each step streams a model response through
//! the [`accumulate`] fold; if the step finalized tool calls, they are
//! dispatched in order, their results and any unknown-tool feedback are
//! appended, and the loop streams again. A step without calls ends the turn.
//!
//! The [`Agent`] is the only writer of its [`Transcript`].

use std::num::NonZeroUsize;
use std::time::Duration;

use thiserror::Error;

use crate::accumulator::accumulate;
use crate::constants::STREAM_IDLE_TIMEOUT_SECS;
use crate::feedback::unknown_tool_feedback;
use crate::message::{ToolInvocation, Transcript, TranscriptError};
use crate::output::Renderer;
use crate::provider::{ModelSource, StepRequest, StreamError, ToolChoice};
use crate::tools::ToolRegistry;

/// Why a turn stopped before the model produced a final answer.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error("turn stopped after {0} steps without a final answer")]
    StepLimit(usize),
    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

/// What one step of a turn produced.
#[derive(Debug, Clone, PartialEq)]
pub struct StepLog {
    pub text: String,
    pub calls: Vec<ToolInvocation>,
}

/// Summary of a completed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Text of the final, call-free step.
    pub final_text: String,
    pub steps: Vec<StepLog>,
    /// Transcript length after the turn, system prompt included.
    pub transcript_len: usize,
}

pub struct Agent {
    source: Box<dyn ModelSource>,
    tools: ToolRegistry,
    transcript: Transcript,
    max_steps: Option<NonZeroUsize>,
    idle_timeout: Duration,
}

impl Agent {
    pub fn new(
        source: Box<dyn ModelSource>,
        tools: ToolRegistry,
        system_prompt: impl Into<String>,
        max_steps: Option<NonZeroUsize>,
    ) -> Self {
        Self {
            source,
            tools,
            transcript: Transcript::new(system_prompt),
            max_steps,
            idle_timeout: Duration::from_secs(STREAM_IDLE_TIMEOUT_SECS),
        }
    }

    /// How long opening a stream, or waiting for its next event, may take
    /// before the step fails with [`StreamError::Timeout`].
    pub fn with_idle_timeout(mut self, idle: Duration) -> Self {
        self.idle_timeout = idle;
        self
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Runs one turn to completion.
    ///
    /// A stream failure or stall aborts the turn; whatever the failing step had
    /// accumulated is dropped and never reaches the transcript. Messages
    /// appended by earlier, completed steps stay.
    pub async fn prompt(
        &mut self,
        text: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<TurnOutcome, TurnError> {
        self.transcript.push_user(text);
        let mut steps = Vec::new();

        loop {
            if let Some(limit) = self.max_steps.map(NonZeroUsize::get) {
                if steps.len() >= limit {
                    tracing::warn!(limit, "step limit reached");
                    return Err(TurnError::StepLimit(limit));
                }
            }

            let request = StepRequest {
                messages: self.transcript.messages(),
                tools: self.tools.specs(),
                tool_choice: ToolChoice::Auto,
            };
            tracing::debug!(step = steps.len() + 1, messages = request.messages.len(), "streaming step");
            let idle = self.idle_timeout;
            let streamed = match tokio::time::timeout(idle, self.source.stream(request)).await {
                Ok(Ok(stream)) => accumulate(stream, renderer, idle).await,
                Ok(Err(e)) => Err(e),
                Err(_) => Err(StreamError::Timeout(idle)),
            };
            let output = streamed.inspect_err(|e| tracing::warn!(error = %e, "model stream failed"))?;
            renderer.render_done();

            steps.push(StepLog {
                text: output.text.clone(),
                calls: output.calls.clone(),
            });

            if output.calls.is_empty() {
                self.transcript.push_assistant(output.text.clone(), Vec::new());
                return Ok(TurnOutcome {
                    final_text: output.text,
                    steps,
                    transcript_len: self.transcript.len(),
                });
            }

            self.transcript.push_assistant(output.text, output.calls.clone());

            let mut results = Vec::with_capacity(output.calls.len());
            for call in &output.calls {
                renderer.tool_call(call);
                let result = self.tools.dispatch(call).await;
                renderer.tool_result(&result);
                self.transcript.push_tool_result(result.clone())?;
                results.push(result);
            }

            if let Some(feedback) = unknown_tool_feedback(&results, &self.tools.names()) {
                renderer.tool_result(&feedback);
                self.transcript.push_tool_result(feedback)?;
            }

            renderer.step_continue();
        }
    }
}
