//! User-defined tools backed by shell commands.
//!
//! Each `[[tools]]` entry in the config becomes an [`ExternalTool`], and
//! `fallback_command` becomes an [`ExternalFallback`] that answers names no
//! tool is registered under. Both run their command with `sh -c` in the
//! working root. The tool name is passed in `OTTO_TOOL_NAME` and the
//! arguments as a JSON object in `OTTO_TOOL_ARGS`.

use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use super::bash_tool::cap_output;
use super::{Tool, ToolError, ToolOutput, UnknownToolHandler};
use crate::config::ToolDefinition;

async fn run_command(
    root: &Path,
    command: &str,
    name: &str,
    args: &Map<String, Value>,
) -> Result<ToolOutput, ToolError> {
    let encoded = serde_json::to_string(args).map_err(|e| ToolError::Failed(e.to_string()))?;
    let output = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(root)
        .env("OTTO_TOOL_NAME", name)
        .env("OTTO_TOOL_ARGS", encoded)
        .stdin(Stdio::null())
        .output()
        .await?;

    let code = output.status.code().unwrap_or(-1);
    Ok(ToolOutput::with_status(
        code == 0,
        json!({
            "stdout": cap_output(&String::from_utf8_lossy(&output.stdout)),
            "stderr": cap_output(&String::from_utf8_lossy(&output.stderr)),
            "exit_code": code,
        }),
    ))
}

pub struct ExternalTool {
    root: PathBuf,
    definition: ToolDefinition,
}

impl ExternalTool {
    pub fn new(root: PathBuf, definition: ToolDefinition) -> Self {
        Self { root, definition }
    }
}

#[async_trait::async_trait]
impl Tool for ExternalTool {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn description(&self) -> &str {
        &self.definition.description
    }

    fn schema(&self) -> Value {
        self.definition
            .parameters
            .clone()
            .unwrap_or_else(|| json!({"type": "object", "properties": {}}))
    }

    async fn execute(&self, args: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        run_command(&self.root, &self.definition.command, &self.definition.name, args).await
    }
}

/// Runs one command for every call to an unregistered name.
pub struct ExternalFallback {
    root: PathBuf,
    command: String,
}

impl ExternalFallback {
    pub fn new(root: PathBuf, command: String) -> Self {
        Self { root, command }
    }
}

#[async_trait::async_trait]
impl UnknownToolHandler for ExternalFallback {
    async fn handle(&self, name: &str, args: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        run_command(&self.root, &self.command, name, args).await
    }
}
