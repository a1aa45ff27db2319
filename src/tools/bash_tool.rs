//! Command tool: shell command execution, foreground or detached.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::process::Stdio;

use super::{parse_input, Tool, ToolError, ToolOutput};

use crate::constants::COMMAND_MAX_OUTPUT_SIZE;

/// Tool that executes shell commands with `sh -c` in the working root.
///
/// Foreground commands are awaited and their output captured; success means
/// exit code zero. Background commands are spawned detached with null stdio
/// and only their process id is reported.
pub struct RunCommandTool {
    root: PathBuf,
}

impl RunCommandTool {
    /// Create a new `RunCommandTool` rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn command(&self, line: &str) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new("sh");
        cmd.arg("-c").arg(line);
        cmd.current_dir(&self.root);
        cmd.stdin(Stdio::null());
        cmd
    }
}

#[derive(Deserialize)]
struct RunCommandInput {
    #[serde(default)]
    command: String,
    #[serde(default)]
    is_background: bool,
}

/// Truncate `output` to at most `COMMAND_MAX_OUTPUT_SIZE` bytes, appending a
/// notice when truncation occurs.
pub(super) fn cap_output(output: &str) -> String {
    if output.len() <= COMMAND_MAX_OUTPUT_SIZE {
        return output.to_string();
    }
    // Find a valid UTF-8 boundary at or before the limit.
    let mut end = COMMAND_MAX_OUTPUT_SIZE;
    while end > 0 && !output.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}\n... output truncated at {} bytes",
        &output[..end],
        COMMAND_MAX_OUTPUT_SIZE
    )
}

#[async_trait::async_trait]
impl Tool for RunCommandTool {
    fn name(&self) -> &str {
        "run_terminal_cmd"
    }

    fn description(&self) -> &str {
        "Run a command non-interactively. Set is_background to start it detached."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {"type": "string"},
                "is_background": {"type": "boolean"}
            },
            "required": ["command", "is_background"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let input: RunCommandInput = parse_input(args)?;
        if input.command.trim().is_empty() {
            return Err(ToolError::InvalidArguments("command required".into()));
        }

        if input.is_background {
            let mut cmd = self.command(&input.command);
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
            let child = cmd.spawn()?;
            let pid = child.id();
            tracing::debug!(?pid, command = %input.command, "started background command");
            // Dropping the handle detaches the process; it keeps running.
            drop(child);
            return Ok(ToolOutput::success(json!({ "pid": pid })));
        }

        let output = self.command(&input.command).output().await?;
        let code = output.status.code().unwrap_or(-1);
        let stdout = cap_output(&String::from_utf8_lossy(&output.stdout));
        let stderr = cap_output(&String::from_utf8_lossy(&output.stderr));

        Ok(ToolOutput::with_status(
            code == 0,
            json!({
                "stdout": stdout,
                "stderr": stderr,
                "exit_code": code,
            }),
        ))
    }
}
