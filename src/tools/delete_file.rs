use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::PathBuf;

use super::{parse_input, Tool, ToolError, ToolOutput};

/// Deletes a file if it exists. Deleting a missing file succeeds.
pub struct DeleteFileTool {
    root: PathBuf,
}

impl DeleteFileTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[derive(Deserialize)]
struct DeleteInput {
    target_file: String,
}

#[async_trait::async_trait]
impl Tool for DeleteFileTool {
    fn name(&self) -> &str {
        "delete_file"
    }

    fn description(&self) -> &str {
        "Delete a file if it exists."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"target_file": {"type": "string"}},
            "required": ["target_file"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let input: DeleteInput = parse_input(args)?;
        let path = self.root.join(&input.target_file);

        let existed = fs::symlink_metadata(&path).is_ok();
        if existed {
            fs::remove_file(&path)?;
        }

        Ok(ToolOutput::success(json!({
            "path": input.target_file,
            "existed": existed,
        })))
    }
}
