//! Environment variable substitution and runtime settings resolution.

use anyhow::Result;
use std::num::NonZeroUsize;
use std::time::Duration;

use super::types::Config;
use crate::constants::{
    API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL, MODEL_ENV_VARS, STREAM_IDLE_TIMEOUT_SECS,
};

/// Values given on the command line. They beat every other source.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_steps: Option<NonZeroUsize>,
    pub verbose: bool,
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_steps: Option<NonZeroUsize>,
    pub stream_timeout: Duration,
    pub verbose: bool,
}

impl Settings {
    /// Resolves settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is available from either the
    /// environment or the config.
    pub fn resolve(config: &Config, cli: &CliOverrides) -> Result<Self> {
        Self::resolve_with(config, cli, |name| std::env::var(name).ok())
    }

    /// Resolves settings using `env` to read environment variables.
    ///
    /// Empty values count as unset everywhere.
    pub(super) fn resolve_with(
        config: &Config,
        cli: &CliOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let env = |name: &str| non_empty(env(name));

        let api_key = env(API_KEY_ENV)
            .or_else(|| non_empty(config.api_key.clone()))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No API key found. Set {} or configure api_key in {}",
                    API_KEY_ENV,
                    crate::constants::CONFIG_FILENAME
                )
            })?;

        let base_url = non_empty(cli.base_url.clone())
            .or_else(|| env(BASE_URL_ENV))
            .or_else(|| non_empty(config.base_url.clone()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let model = non_empty(cli.model.clone())
            .or_else(|| MODEL_ENV_VARS.iter().find_map(|var| env(*var)))
            .or_else(|| non_empty(config.model.clone()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            api_key,
            base_url,
            model,
            max_steps: cli.max_steps.or(config.max_steps),
            stream_timeout: Duration::from_secs(
                config
                    .stream_timeout_secs
                    .filter(|secs| *secs > 0)
                    .unwrap_or(STREAM_IDLE_TIMEOUT_SECS),
            ),
            verbose: cli.verbose || config.verbose.unwrap_or(false),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Resolve {env:VAR_NAME} patterns in string fields.
    pub(super) fn resolve_substitutions(&mut self) {
        for field in [
            &mut self.model,
            &mut self.api_key,
            &mut self.base_url,
            &mut self.system_prompt,
        ] {
            if let Some(value) = field {
                *value = Self::resolve_str(value);
            }
        }
    }

    /// Replace {env:VAR} with the environment variable value.
    fn resolve_str(s: &str) -> String {
        let mut result = s.to_string();
        while let Some(start) = result.find("{env:") {
            if let Some(end) = result[start..].find('}') {
                let var_name = &result[start + 5..start + end];
                let value = std::env::var(var_name).unwrap_or_default();
                result = format!(
                    "{}{}{}",
                    &result[..start],
                    value,
                    &result[start + end + 1..]
                );
            } else {
                break;
            }
        }
        result
    }

    /// Copy of this config safe to print: the API key is masked.
    pub fn redacted(&self) -> Config {
        let mut shown = self.clone();
        if let Some(key) = shown.api_key.as_mut() {
            *key = mask_key(key);
        }
        shown
    }
}

fn mask_key(key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }
    let count = key.chars().count();
    if count <= 8 {
        return "****".to_string();
    }
    let tail: String = key.chars().skip(count - 4).collect();
    format!("****{tail}")
}
