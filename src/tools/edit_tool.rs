//! Edit tool: writes a file from a model-provided edit snippet.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::PathBuf;

use super::{parse_input, Tool, ToolError, ToolOutput};
use crate::constants::{EDIT_ELLIPSIS_MARKERS, EDIT_PARTIAL_PREFIX};

/// Tool that applies an edit snippet to a file.
///
/// A snippet that elides unchanged regions with an ellipsis marker is
/// appended to the existing file so those regions survive; any other
/// snippet replaces the file content. Parent directories are created.
pub struct EditFileTool {
    root: PathBuf,
}

impl EditFileTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[derive(Deserialize)]
struct EditInput {
    target_file: String,
    #[allow(dead_code)]
    instructions: String,
    code_edit: String,
}

/// Whether `code_edit` is a partial snippet rather than full file content.
fn is_partial_edit(code_edit: &str) -> bool {
    code_edit.trim_start().starts_with(EDIT_PARTIAL_PREFIX)
        || EDIT_ELLIPSIS_MARKERS.iter().any(|m| code_edit.contains(m))
}

#[async_trait::async_trait]
impl Tool for EditFileTool {
    fn name(&self) -> &str {
        "edit_file"
    }

    fn description(&self) -> &str {
        "Write a file. Provide full content to replace it, or a snippet using \
         '// ... existing code ...' markers to append to the existing content."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "target_file": {"type": "string"},
                "instructions": {"type": "string"},
                "code_edit": {"type": "string"}
            },
            "required": ["target_file", "instructions", "code_edit"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let input: EditInput = parse_input(args)?;
        if input.code_edit.trim().is_empty() {
            return Err(ToolError::InvalidArguments("empty code_edit".into()));
        }

        let path = self.root.join(&input.target_file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mode = if is_partial_edit(&input.code_edit) {
            let existing = if path.exists() {
                fs::read_to_string(&path)?
            } else {
                String::new()
            };
            fs::write(&path, format!("{existing}\n{}\n", input.code_edit))?;
            "appended"
        } else {
            fs::write(&path, &input.code_edit)?;
            "replaced"
        };

        Ok(ToolOutput::success(json!({
            "path": input.target_file,
            "mode": mode,
        })))
    }
}
