//! Centralized constants for otto.
//!
//! All magic numbers, default strings, and configuration constants live here
//! so they can be changed in one place.

/// Application name used in CLI output and directory paths.
pub const APP_NAME: &str = "otto";

/// Fallback model identifier when neither flags, environment nor config name one.
pub const DEFAULT_MODEL: &str = "gpt-5-mini";

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Environment variable holding the API credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable holding an alternate endpoint.
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Environment variables consulted (in order) for the model identifier.
pub const MODEL_ENV_VARS: &[&str] = &["MODEL", "OTTO_MODEL"];

/// Built-in system prompt used when no prompt file or config value exists.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI coding assistant. You operate in a CLI. \
You have tools and must autonomously use them to complete tasks.";

/// Prompt files looked up (in order of preference) inside each prompt directory.
pub const PREFERRED_PROMPT_FILES: &[&str] = &[
    "Agent Prompt 2025-09-03.txt",
    "Agent Prompt v1.2.txt",
    "Agent CLI Prompt 2025-08-07.txt",
];

/// Configuration filename.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Per-project configuration filename.
pub const PROJECT_CONFIG_FILENAME: &str = "otto.toml";

/// Readline history filename.
pub const HISTORY_FILENAME: &str = "history.txt";

/// REPL prompt.
pub const USER_PROMPT: &str = "you> ";

// --- Streaming ---

/// Prefix for call ids synthesized when the model omits one (`tool_<index>`).
pub const SYNTHETIC_CALL_ID_PREFIX: &str = "tool_";

/// Prefix for the call id of the synthetic unknown-tool feedback result.
pub const FEEDBACK_CALL_ID_PREFIX: &str = "feedback_";

/// Seconds a model stream may stay silent before the step fails.
pub const STREAM_IDLE_TIMEOUT_SECS: u64 = 120;

/// Seconds allowed to establish the connection to the model endpoint.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

// --- Output ---

/// Maximum characters of a tool result shown in verbose mode.
pub const RESULT_PREVIEW_CHARS: usize = 500;

// --- Tool limits ---

/// Maximum number of paths the file_search tool returns.
pub const FILE_SEARCH_MAX_RESULTS: usize = 50;

/// Byte threshold for binary file detection (check first N bytes for null).
pub const BINARY_DETECTION_BYTES: usize = 8192;

/// Maximum bytes kept from each of stdout/stderr of a foreground command.
pub const COMMAND_MAX_OUTPUT_SIZE: usize = 100 * 1024;

/// Markers that make `edit_file` append instead of replace.
pub const EDIT_ELLIPSIS_MARKERS: &[&str] = &["// ... existing code ...", "# ... existing code ..."];

/// Leading snippet prefix that also counts as a partial edit.
pub const EDIT_PARTIAL_PREFIX: &str = "// ...";
