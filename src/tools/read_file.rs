use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};
use std::path::PathBuf;

use super::{parse_input, Tool, ToolError, ToolOutput};

pub struct ReadFileTool {
    /// Directory relative paths are resolved against.
    root: PathBuf,
}

impl ReadFileTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[derive(Deserialize)]
struct ReadFileInput {
    path: String,
    #[serde(default, deserialize_with = "line_number")]
    start: Option<i64>,
    #[serde(default, deserialize_with = "line_number")]
    end: Option<i64>,
}

/// Accepts a line number as a JSON integer or a numeric string; models send both.
fn line_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("line number expected, got {s:?}"))),
    }
}

/// Returns lines `start..=end` (1-based) when `end` is at or past `start`,
/// otherwise the whole text unchanged. A missing or non-positive `start`
/// means line 1.
fn slice_lines(text: &str, start: Option<i64>, end: Option<i64>) -> String {
    let start = start.filter(|s| *s >= 1).unwrap_or(1);
    match end {
        Some(end) if end >= start => text
            .lines()
            .skip((start - 1) as usize)
            .take((end - start + 1) as usize)
            .collect::<Vec<_>>()
            .join("\n"),
        _ => text.to_string(),
    }
}

#[async_trait::async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a file slice or whole file. Lines are 1-based and inclusive."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string"},
                "start": {"type": "integer"},
                "end": {"type": "integer"}
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let input: ReadFileInput = parse_input(args)?;
        let text = std::fs::read_to_string(self.root.join(&input.path))?;
        let content = slice_lines(&text, input.start, input.end);
        Ok(ToolOutput::success(json!({
            "path": input.path,
            "content": content,
        })))
    }
}
