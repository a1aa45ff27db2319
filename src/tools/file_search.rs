use glob::{MatchOptions, Pattern};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

use super::{parse_input, Tool, ToolError, ToolOutput};
use crate::constants::FILE_SEARCH_MAX_RESULTS;

/// Case-insensitive substring search over relative file paths.
pub struct FileSearchTool {
    root: PathBuf,
}

impl FileSearchTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn search(&self, query: &str) -> Vec<String> {
        let query = query.to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let pattern = format!("{}/**/*", Pattern::escape(&self.root.to_string_lossy()));
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        let Ok(paths) = glob::glob_with(&pattern, options) else {
            return Vec::new();
        };

        let mut hits = Vec::new();
        for path in paths.filter_map(Result::ok) {
            if !path.is_file() {
                continue;
            }
            let relative = relative_display(&path, &self.root);
            if relative.to_lowercase().contains(&query) {
                hits.push(relative);
                if hits.len() >= FILE_SEARCH_MAX_RESULTS {
                    break;
                }
            }
        }
        hits
    }
}

fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[derive(Deserialize)]
struct FileSearchInput {
    #[serde(default)]
    query: String,
}

#[async_trait::async_trait]
impl Tool for FileSearchTool {
    fn name(&self) -> &str {
        "file_search"
    }

    fn description(&self) -> &str {
        "Fuzzy file search by substring. Returns up to 50 relative paths."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"query": {"type": "string"}},
            "required": ["query"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let input: FileSearchInput = parse_input(args)?;
        let results = self.search(&input.query);
        Ok(ToolOutput::success(json!({ "results": results })))
    }
}
