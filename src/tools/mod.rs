//! Tool registry and built-in tools.
//!
//! The registry is built once at startup. It advertises a stable list of
//! [`ToolSpec`]s to the model and dispatches each [`ToolInvocation`] to the
//! tool with the matching name, always producing a [`ToolResult`]: handler
//! failures and panics become `ok: false` payloads, and names with no tool
//! become unknown-operation results unless a fallback handler answers them.

pub mod bash_tool;
pub mod delete_file;
pub mod edit_tool;
pub mod external;
pub mod file_search;
pub mod grep_tool;
pub mod list_dir;
pub mod read_file;

use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use thiserror::Error;

use crate::message::{Outcome, ResultSource, ToolInvocation, ToolResult};

use bash_tool::RunCommandTool;
use delete_file::DeleteFileTool;
use edit_tool::EditFileTool;
use file_search::FileSearchTool;
use grep_tool::GrepSearchTool;
use list_dir::ListDirTool;
use read_file::ReadFileTool;

/// Declaration sent to the model so it knows what tools are available.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value, // JSON Schema
}

/// What a tool hands back on a completed run.
///
/// `ok` is false for runs that completed but failed by the tool's own
/// convention, such as a command exiting non-zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub ok: bool,
    pub body: Map<String, Value>,
}

impl ToolOutput {
    pub fn success(body: Value) -> Self {
        Self::with_status(true, body)
    }

    pub fn with_status(ok: bool, body: Value) -> Self {
        let body = match body {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("result".into(), other);
                map
            }
        };
        Self { ok, body }
    }

    fn into_payload(self) -> Value {
        let mut payload = self.body;
        payload.insert("ok".into(), Value::Bool(self.ok));
        Value::Object(payload)
    }
}

/// Reasons a tool could not complete.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Failed(String),
}

impl ToolError {
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::Io(_) => "io",
            ToolError::InvalidArguments(_) => "invalid_arguments",
            ToolError::Failed(_) => "failed",
        }
    }
}

/// Deserializes a tool's typed input from the raw argument bag.
pub(crate) fn parse_input<T: DeserializeOwned>(args: &Map<String, Value>) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(args.clone()))
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Every tool implements this trait.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the model uses to call this tool.
    fn name(&self) -> &str;

    /// Human-readable description for the model.
    fn description(&self) -> &str;

    /// JSON Schema describing the tool's input parameters.
    fn schema(&self) -> Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, args: &Map<String, Value>) -> Result<ToolOutput, ToolError>;
}

/// Catch-all consulted for names no registered tool answers to.
///
/// A call it handles produces an ordinary success or failure result, so the
/// model is not told the name was unknown.
#[async_trait::async_trait]
pub trait UnknownToolHandler: Send + Sync {
    async fn handle(&self, name: &str, args: &Map<String, Value>) -> Result<ToolOutput, ToolError>;
}

/// Holds all registered tools and dispatches calls by name.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    specs: Vec<ToolSpec>,
    fallback: Option<Box<dyn UnknownToolHandler>>,
}

fn spec_of(tool: &dyn Tool) -> ToolSpec {
    ToolSpec {
        name: tool.name().to_string(),
        description: tool.description().to_string(),
        parameters: tool.schema(),
    }
}

impl ToolRegistry {
    fn new(tools: Vec<Box<dyn Tool>>) -> Self {
        let specs = tools.iter().map(|t| spec_of(t.as_ref())).collect();
        Self {
            tools,
            specs,
            fallback: None,
        }
    }

    /// Create a registry with all built-in tools rooted at `root`.
    pub fn with_builtins(root: PathBuf) -> Self {
        Self::new(vec![
            Box::new(ReadFileTool::new(root.clone())),
            Box::new(ListDirTool::new(root.clone())),
            Box::new(GrepSearchTool::new(root.clone())),
            Box::new(FileSearchTool::new(root.clone())),
            Box::new(EditFileTool::new(root.clone())),
            Box::new(DeleteFileTool::new(root.clone())),
            Box::new(RunCommandTool::new(root)),
        ])
    }

    /// Adds a tool after the built-ins.
    ///
    /// A tool whose name is already registered replaces the earlier one in
    /// place, keeping its position in the advertised list.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let spec = spec_of(tool.as_ref());
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(i) => {
                tracing::debug!(name = %spec.name, "replacing registered tool");
                self.tools[i] = tool;
                self.specs[i] = spec;
            }
            None => {
                self.tools.push(tool);
                self.specs.push(spec);
            }
        }
    }

    /// Routes calls to unregistered names through `handler` instead of
    /// answering them as unknown.
    pub fn set_fallback(&mut self, handler: Box<dyn UnknownToolHandler>) {
        self.fallback = Some(handler);
    }

    /// Tool declarations in registration order.
    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    /// Names of all registered tools in registration order.
    pub fn names(&self) -> Vec<String> {
        self.specs.iter().map(|s| s.name.clone()).collect()
    }

    /// Look up a tool by name and execute it.
    ///
    /// Never fails: every failure mode is folded into the returned result.
    pub async fn dispatch(&self, call: &ToolInvocation) -> ToolResult {
        let args = call.parsed_arguments();
        let run = match self.tools.iter().find(|t| t.name() == call.name) {
            Some(tool) => {
                tracing::debug!(call = %call.id, name = %call.name, "dispatching tool");
                AssertUnwindSafe(tool.execute(&args)).catch_unwind().await
            }
            None => match &self.fallback {
                Some(fallback) => {
                    tracing::debug!(call = %call.id, name = %call.name, "dispatching to fallback handler");
                    AssertUnwindSafe(fallback.handle(&call.name, &args)).catch_unwind().await
                }
                None => {
                    tracing::debug!(call = %call.id, name = %call.name, "unknown tool requested");
                    return unknown_tool(call);
                }
            },
        };

        let (outcome, payload) = match run {
            Ok(Ok(output)) => {
                let outcome = if output.ok {
                    Outcome::Success
                } else {
                    Outcome::Failure
                };
                (outcome, output.into_payload())
            }
            Ok(Err(e)) => (Outcome::Failure, error_payload(&e)),
            Err(_) => {
                tracing::warn!(name = %call.name, "tool panicked");
                let e = ToolError::Failed(format!("tool '{}' panicked", call.name));
                (Outcome::Failure, error_payload(&e))
            }
        };

        ToolResult {
            call_id: call.id.clone(),
            name: call.name.clone(),
            outcome,
            source: ResultSource::Registry,
            payload,
        }
    }
}

fn error_payload(e: &ToolError) -> Value {
    json!({"ok": false, "error": e.to_string(), "kind": e.kind()})
}

/// The structurally marked result for a name no tool answers to.
fn unknown_tool(call: &ToolInvocation) -> ToolResult {
    ToolResult {
        call_id: call.id.clone(),
        name: call.name.clone(),
        outcome: Outcome::UnknownOperation,
        source: ResultSource::Registry,
        payload: json!({
            "ok": false,
            "error": format!("Unknown tool '{}'", call.name),
            "unknown_tool": true,
            "name": call.name,
        }),
    }
}

#[cfg(test)]
mod tests;
