//! File loading and merging for otto configuration.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::types::Config;

/// Written on first run so users have something to edit.
const DEFAULT_CONFIG_TOML: &str = r#"# otto configuration
# model = "gpt-5-mini"
# base_url = "https://api.openai.com/v1"
api_key = "{env:OPENAI_API_KEY}"
# stream_timeout_secs = 120
# fallback_command = "./scripts/handle-tool"
#
# [[tools]]
# name = "lint"
# description = "Run the project linter"
# command = "make lint"
"#;

impl Config {
    /// Loads the global config from `~/.config/otto/config.toml`.
    ///
    /// If no config file exists, creates one with an `{env:VAR}` placeholder
    /// for the API key and returns it.
    pub(super) fn load_global() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            if let Err(e) = fs::write(&path, DEFAULT_CONFIG_TOML) {
                tracing::debug!(path = %path.display(), error = %e, "could not write default config");
            }
            return Self::parse(DEFAULT_CONFIG_TOML, &path);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        Self::parse(&contents, &path)
    }

    /// Look for otto.toml in `start`, then walk up to the git root.
    pub(super) fn load_project(start: &Path) -> Result<Option<Config>> {
        let mut dir = start.to_path_buf();
        loop {
            let candidate = dir.join(crate::constants::PROJECT_CONFIG_FILENAME);
            if candidate.exists() {
                let contents = fs::read_to_string(&candidate)
                    .with_context(|| format!("Failed to read config from {:?}", candidate))?;
                return Self::parse(&contents, &candidate).map(Some);
            }
            // Stop at git root or filesystem root
            if dir.join(".git").exists() || !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    fn parse(contents: &str, path: &Path) -> Result<Config> {
        toml::from_str(contents).with_context(|| format!("Failed to parse config at {:?}", path))
    }

    /// Merge project config over global config.
    /// Project values win when present; tool lists are concatenated.
    pub(super) fn merge(global: Config, project: Config) -> Config {
        Config {
            model: project.model.or(global.model),
            api_key: project.api_key.or(global.api_key),
            base_url: project.base_url.or(global.base_url),
            system_prompt: project.system_prompt.or(global.system_prompt),
            max_steps: project.max_steps.or(global.max_steps),
            stream_timeout_secs: project.stream_timeout_secs.or(global.stream_timeout_secs),
            verbose: project.verbose.or(global.verbose),
            fallback_command: project.fallback_command.or(global.fallback_command),
            // Later definitions replace earlier ones of the same name when registered.
            tools: global.tools.into_iter().chain(project.tools).collect(),
        }
    }
}
