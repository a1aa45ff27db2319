//! Regex search tool backed by ripgrep.
//!
//! Runs `rg` as a child process and reports its output verbatim. Exit status
//! 0 (matches) and 1 (no matches) both count as success. When `rg` is not
//! installed, an in-process walker produces the same payload shape.

use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use super::{parse_input, Tool, ToolError, ToolOutput};
use crate::constants::BINARY_DETECTION_BYTES;

/// ripgrep's exit status for "no matches".
const EXIT_NO_MATCH: i32 = 1;
/// ripgrep's exit status for errors.
const EXIT_ERROR: i32 = 2;

pub struct GrepSearchTool {
    root: PathBuf,
}

impl GrepSearchTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[derive(Deserialize)]
struct GrepInput {
    #[serde(default)]
    pattern: String,
    path: Option<String>,
}

/// Captured result of one search run, in ripgrep's terms.
struct SearchRun {
    stdout: String,
    stderr: String,
    exit_code: i32,
}

impl SearchRun {
    fn into_output(self) -> ToolOutput {
        ToolOutput::with_status(
            self.exit_code == 0 || self.exit_code == EXIT_NO_MATCH,
            json!({
                "stdout": self.stdout,
                "stderr": self.stderr,
                "exit_code": self.exit_code,
            }),
        )
    }
}

/// Searches with ripgrep. Returns `Ok(None)` when `rg` is not on `PATH`.
async fn run_ripgrep(root: &Path, pattern: &str, path: &str) -> Result<Option<SearchRun>, ToolError> {
    let output = tokio::process::Command::new("rg")
        .args(["-n", "--color=never", "-e", pattern, "--", path])
        .current_dir(root)
        .stdin(Stdio::null())
        .output()
        .await;

    match output {
        Ok(output) => Ok(Some(SearchRun {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ToolError::Io(e)),
    }
}

/// In-process stand-in for ripgrep.
///
/// Skips hidden entries and binary files like ripgrep does by default and
/// prints `path:line:text` (or `line:text` when searching a single file).
fn search_in_process(root: &Path, pattern: &str, path: &str) -> SearchRun {
    let regex = match Regex::new(pattern) {
        Ok(r) => r,
        Err(e) => {
            return SearchRun {
                stdout: String::new(),
                stderr: format!("regex parse error: {e}\n"),
                exit_code: EXIT_ERROR,
            }
        }
    };

    let target = root.join(path);
    let mut lines = Vec::new();
    if target.is_file() {
        search_file(&target, None, &regex, &mut lines);
    } else if target.is_dir() {
        walk_and_search(&target, Path::new(path), &regex, &mut lines);
    } else {
        return SearchRun {
            stdout: String::new(),
            stderr: format!("{path}: No such file or directory (os error 2)\n"),
            exit_code: EXIT_ERROR,
        };
    }

    let exit_code = if lines.is_empty() { EXIT_NO_MATCH } else { 0 };
    let mut stdout = lines.join("\n");
    if !stdout.is_empty() {
        stdout.push('\n');
    }
    SearchRun {
        stdout,
        stderr: String::new(),
        exit_code,
    }
}

/// Recursively walk directories, searching files for regex matches.
fn walk_and_search(dir: &Path, display: &Path, regex: &Regex, lines: &mut Vec<String>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return, // silently skip unreadable dirs
    };

    let mut entries: Vec<_> = entries.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let file_name = entry.file_name();
        if file_name.to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        let shown = display.join(&file_name);
        if path.is_dir() {
            walk_and_search(&path, &shown, regex, lines);
        } else if path.is_file() {
            search_file(&path, Some(&shown), regex, lines);
        }
    }
}

/// Search a single file for regex matches.
fn search_file(path: &Path, shown: Option<&Path>, regex: &Regex, lines: &mut Vec<String>) {
    let content = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return,
    };

    // Check for binary content (null bytes in first 8KB)
    let check_len = content.len().min(BINARY_DETECTION_BYTES);
    if content[..check_len].contains(&0) {
        return;
    }

    let text = match String::from_utf8(content) {
        Ok(s) => s,
        Err(_) => return,
    };

    for (line_num, line) in text.lines().enumerate() {
        if regex.is_match(line) {
            match shown {
                Some(shown) => lines.push(format!("{}:{}:{}", shown.display(), line_num + 1, line)),
                None => lines.push(format!("{}:{}", line_num + 1, line)),
            }
        }
    }
}

#[async_trait::async_trait]
impl Tool for GrepSearchTool {
    fn name(&self) -> &str {
        "grep_search"
    }

    fn description(&self) -> &str {
        "Exact regex search (ripgrep). Returns matching lines with file paths and line numbers."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {"type": "string"},
                "path": {"type": "string"}
            },
            "required": ["pattern"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let input: GrepInput = parse_input(args)?;
        if input.pattern.is_empty() {
            return Err(ToolError::InvalidArguments("pattern required".into()));
        }
        let path = input.path.as_deref().unwrap_or(".");

        let run = match run_ripgrep(&self.root, &input.pattern, path).await? {
            Some(run) => run,
            None => {
                tracing::debug!("rg not found, searching in process");
                search_in_process(&self.root, &input.pattern, path)
            }
        };
        Ok(run.into_output())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), "fn alpha() {}\nfn beta() {}\n").unwrap();
        fs::write(dir.path().join(".hidden"), "fn alpha() {}\n").unwrap();
        dir
    }

    #[test]
    fn test_in_process_matches_directory() {
        let dir = fixture();
        let run = search_in_process(dir.path(), "fn b\\w+", ".");
        assert_eq!(run.exit_code, 0);
        assert_eq!(run.stdout, "./src/lib.rs:2:fn beta() {}\n");
    }

    #[test]
    fn test_in_process_single_file() {
        let dir = fixture();
        let run = search_in_process(dir.path(), "alpha", "src/lib.rs");
        assert_eq!(run.stdout, "1:fn alpha() {}\n");
    }

    #[test]
    fn test_in_process_no_match_is_exit_one() {
        let dir = fixture();
        let run = search_in_process(dir.path(), "gamma", ".");
        assert_eq!(run.exit_code, EXIT_NO_MATCH);
        assert!(run.into_output().ok);
    }

    #[test]
    fn test_in_process_invalid_regex_fails() {
        let dir = fixture();
        let run = search_in_process(dir.path(), "[invalid", ".");
        assert_eq!(run.exit_code, EXIT_ERROR);
        assert!(!run.into_output().ok);
    }
}
