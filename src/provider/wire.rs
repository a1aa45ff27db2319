//! Conversion of the transcript and tool specs into an OpenAI-compatible
//! chat-completions request body.

use serde_json::{json, Value};

use super::source::StepRequest;
use crate::message::{Message, ResultSource};
use crate::tools::ToolSpec;

/// Builds the streaming request body for one step.
pub fn request_body(model: &str, request: &StepRequest<'_>) -> Value {
    let messages: Vec<Value> = request.messages.iter().map(message_to_wire).collect();
    let tools: Vec<Value> = request.tools.iter().map(spec_to_wire).collect();

    let mut body = json!({
        "model": model,
        "messages": messages,
        "stream": true,
    });
    if !tools.is_empty() {
        body["tools"] = Value::Array(tools);
        body["tool_choice"] = json!(request.tool_choice.as_str());
    }
    body
}

fn spec_to_wire(spec: &ToolSpec) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": spec.name,
            "description": spec.description,
            "parameters": spec.parameters,
        }
    })
}

/// Converts one transcript message to its wire form.
///
/// - **Assistant** with calls → `content: null` when the text is empty, plus `tool_calls`
/// - **ToolResult** from the registry → `role: "tool"` answering its call id
/// - **ToolResult** from the feedback path → `role: "system"`, since it answers no call
pub fn message_to_wire(message: &Message) -> Value {
    match message {
        Message::System { content } | Message::User { content } => {
            json!({"role": message.role().to_string(), "content": content})
        }
        Message::Assistant { content, tool_calls } if tool_calls.is_empty() => {
            json!({"role": "assistant", "content": content})
        }
        Message::Assistant { content, tool_calls } => {
            let calls: Vec<Value> = tool_calls
                .iter()
                .map(|call| {
                    json!({
                        "id": call.id,
                        "type": "function",
                        "function": {"name": call.name, "arguments": call.arguments},
                    })
                })
                .collect();
            let content = if content.is_empty() {
                Value::Null
            } else {
                Value::String(content.clone())
            };
            json!({"role": "assistant", "content": content, "tool_calls": calls})
        }
        Message::ToolResult(result) => match result.source {
            ResultSource::Registry => json!({
                "role": "tool",
                "tool_call_id": result.call_id,
                "name": result.name,
                "content": result.content(),
            }),
            ResultSource::Feedback => {
                let text = result
                    .payload
                    .get("error")
                    .and_then(Value::as_str)
                    .map(String::from)
                    .unwrap_or_else(|| result.content());
                json!({"role": "system", "content": text})
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Outcome, ToolInvocation, ToolResult};
    use crate::provider::source::ToolChoice;

    #[test]
    fn test_request_body_shape() {
        let messages = vec![Message::system("sys"), Message::user("hi")];
        let tools = vec![ToolSpec {
            name: "list_dir".into(),
            description: "List directory entries.".into(),
            parameters: json!({"type": "object"}),
        }];
        let request = StepRequest {
            messages: &messages,
            tools: &tools,
            tool_choice: ToolChoice::Auto,
        };
        let body = request_body("gpt-5-mini", &request);
        assert_eq!(body["model"], "gpt-5-mini");
        assert_eq!(body["stream"], true);
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["messages"][1], json!({"role": "user", "content": "hi"}));
        assert_eq!(body["tools"][0]["function"]["name"], "list_dir");
    }

    #[test]
    fn test_assistant_with_calls_has_null_content() {
        let message = Message::assistant("", vec![ToolInvocation::new("c1", "read_file", "{\"path\":\"a\"}")]);
        let wire = message_to_wire(&message);
        assert_eq!(wire["content"], Value::Null);
        assert_eq!(wire["tool_calls"][0]["id"], "c1");
        assert_eq!(wire["tool_calls"][0]["function"]["arguments"], "{\"path\":\"a\"}");
    }

    #[test]
    fn test_tool_results_by_source() {
        let mut result = ToolResult {
            call_id: "c1".into(),
            name: "list_dir".into(),
            outcome: Outcome::Success,
            source: ResultSource::Registry,
            payload: json!({"ok": true}),
        };
        let wire = message_to_wire(&Message::ToolResult(result.clone()));
        assert_eq!(wire["role"], "tool");
        assert_eq!(wire["tool_call_id"], "c1");
        assert_eq!(wire["content"], "{\"ok\":true}");

        result.source = ResultSource::Feedback;
        result.payload = json!({"ok": false, "error": "Unknown tool(s): x"});
        let wire = message_to_wire(&Message::ToolResult(result));
        assert_eq!(wire, json!({"role": "system", "content": "Unknown tool(s): x"}));
    }
}
