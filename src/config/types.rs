//! Struct definitions for otto configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::num::NonZeroUsize;

/// Root configuration for otto, deserialized from `config.toml` / `otto.toml`.
///
/// Every field is optional: anything left unset falls through to the
/// environment or the built-in default when [`Settings`](super::Settings)
/// are resolved.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    /// Model identifier (e.g. `"gpt-5-mini"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// API key. The `OPENAI_API_KEY` environment variable takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Custom base URL for an OpenAI-compatible endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// System prompt text, used instead of any prompt file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Upper bound on model steps per turn. Unbounded when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<NonZeroUsize>,
    /// Seconds to wait for the model stream to open or produce its next event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_timeout_secs: Option<u64>,
    /// Print tool call diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    /// Shell command run for tool names nothing is registered under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_command: Option<String>,
    /// Extra tools advertised after the built-ins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// A `[[tools]]` entry: a tool the model can call that runs a shell command.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub command: String,
    /// JSON Schema for the arguments. Defaults to an empty object schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}
