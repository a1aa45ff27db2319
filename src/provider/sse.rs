//! Server-sent-events decoding for OpenAI-compatible chat completion streams.
//!
//! [`SseDecoder`] is fed raw body bytes as they arrive and yields one
//! [`StreamEvent`] per `data:` line that carries text or tool-call deltas.
//! Lines may be split across network chunks, so bytes are buffered until a
//! newline arrives. When the body ends, [`SseDecoder::finish`] decodes any
//! final line that never got one.

use serde::Deserialize;
use serde_json::Value;

use super::source::{CallFragment, StreamError, StreamEvent};

#[derive(Deserialize)]
struct ChunkBody {
    choices: Option<Vec<Choice>>,
    error: Option<Value>,
}

#[derive(Deserialize)]
struct Choice {
    delta: Option<Delta>,
}

#[derive(Deserialize)]
struct Delta {
    content: Option<String>,
    tool_calls: Option<Vec<DeltaCall>>,
}

#[derive(Deserialize)]
struct DeltaCall {
    index: Option<u32>,
    id: Option<String>,
    function: Option<DeltaFunction>,
}

#[derive(Deserialize)]
struct DeltaFunction {
    name: Option<String>,
    arguments: Option<String>,
}

/// Incremental decoder for an SSE response body.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes a chunk of body bytes and returns the events completed by it.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Result<StreamEvent, StreamError>> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if self.done {
                continue;
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.decode_line(line.trim_end_matches(['\n', '\r'])) {
                events.push(event);
            }
        }

        events
    }

    /// Decodes the unterminated tail left in the buffer once the body ends.
    ///
    /// A truncated chunk surfaces as [`StreamError::Decode`]. The decoder
    /// yields nothing after this.
    pub fn finish(&mut self) -> Option<Result<StreamEvent, StreamError>> {
        let rest = std::mem::take(&mut self.buffer);
        if self.done {
            return None;
        }
        let line = String::from_utf8_lossy(&rest);
        let event = self.decode_line(line.trim_end_matches(['\n', '\r']));
        self.done = true;
        event
    }

    fn decode_line(&mut self, line: &str) -> Option<Result<StreamEvent, StreamError>> {
        let data = line.strip_prefix("data:")?.trim_start();
        if data == "[DONE]" {
            self.done = true;
            return None;
        }
        if data.is_empty() {
            return None;
        }
        match parse_chunk(data) {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Converts one JSON chunk into an event, or `None` if it carries nothing
/// the accumulator cares about (role-only deltas, usage chunks).
pub fn parse_chunk(data: &str) -> Result<Option<StreamEvent>, StreamError> {
    let body: ChunkBody =
        serde_json::from_str(data).map_err(|e| StreamError::Decode(format!("{e}: {data}")))?;

    if let Some(error) = body.error {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| error.to_string());
        return Err(StreamError::Decode(message));
    }

    let Some(delta) = body
        .choices
        .and_then(|choices| choices.into_iter().next())
        .and_then(|choice| choice.delta)
    else {
        return Ok(None);
    };

    let text = delta.content.filter(|t| !t.is_empty());
    let calls: Vec<CallFragment> = delta
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| {
            let (name, arguments) = match call.function {
                Some(f) => (f.name, f.arguments),
                None => (None, None),
            };
            CallFragment {
                index: call.index.unwrap_or(0),
                id: call.id,
                name,
                arguments,
            }
        })
        .collect();

    if text.is_none() && calls.is_empty() {
        return Ok(None);
    }
    Ok(Some(StreamEvent { text, calls }))
}
