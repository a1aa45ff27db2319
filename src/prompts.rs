//! System prompt resolution.
//!
//! A configured prompt wins. Otherwise the first preferred prompt file found
//! in the search directories is used, and failing that the built-in default.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::constants::{DEFAULT_SYSTEM_PROMPT, PREFERRED_PROMPT_FILES};

/// Directories searched for prompt files, in order.
pub fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.join("prompts"));
        dirs.push(cwd.join(crate::constants::APP_NAME).join("prompts"));
    }
    if let Ok(config_dir) = Config::config_dir() {
        dirs.push(config_dir.join("prompts"));
    }
    dirs
}

/// Resolves the system prompt for a new transcript.
pub fn system_prompt(configured: Option<&str>, dirs: &[PathBuf]) -> String {
    if let Some(text) = configured.filter(|t| !t.trim().is_empty()) {
        return text.to_string();
    }
    find_prompt_file(dirs)
        .and_then(|path| read_prompt(&path))
        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
}

/// Directories are tried in order; within one, files in preference order.
fn find_prompt_file(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| PREFERRED_PROMPT_FILES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

fn read_prompt(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => {
            tracing::debug!(path = %path.display(), "loaded system prompt");
            Some(text)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read prompt file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_prompt_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PREFERRED_PROMPT_FILES[0]), "from file").unwrap();
        let prompt = system_prompt(Some("from config"), &[dir.path().to_path_buf()]);
        assert_eq!(prompt, "from config");
    }

    #[test]
    fn test_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(system_prompt(None, &[dir.path().to_path_buf()]), DEFAULT_SYSTEM_PROMPT);
        assert_eq!(system_prompt(Some("  "), &[]), DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_preferred_file_order_within_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PREFERRED_PROMPT_FILES[2]), "third").unwrap();
        fs::write(dir.path().join(PREFERRED_PROMPT_FILES[1]), "second").unwrap();
        assert_eq!(system_prompt(None, &[dir.path().to_path_buf()]), "second");
    }

    #[test]
    fn test_earlier_directory_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(first.path().join(PREFERRED_PROMPT_FILES[2]), "first dir").unwrap();
        fs::write(second.path().join(PREFERRED_PROMPT_FILES[0]), "second dir").unwrap();
        let dirs = [first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(system_prompt(None, &dirs), "first dir");
    }
}
