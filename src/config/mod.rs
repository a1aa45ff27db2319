//! Configuration types and path resolution for otto.
//!
//! Otto reads settings as TOML from the platform's XDG config path
//! (e.g. `~/.config/otto/config.toml` on Linux), overlaid by a project
//! `otto.toml`. [`Settings`] combine that with the environment and
//! command-line flags.

mod loader;
mod paths;
mod resolve;
mod types;

pub use resolve::{CliOverrides, Settings};
pub use types::{Config, ToolDefinition};

use anyhow::Result;

impl Config {
    /// Load config with precedence: project > global > defaults.
    /// Creates default config file if none exists.
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project(&std::env::current_dir()?)?;

        let mut config = global;
        if let Some(proj) = project {
            config = Self::merge(config, proj);
        }

        config.resolve_substitutions();
        Ok(config)
    }
}
