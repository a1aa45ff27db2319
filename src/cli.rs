//! Command-line interface definition and dispatch for otto.
//!
//! Uses [`clap`] for argument parsing with derive macros. With no subcommand
//! otto starts the interactive REPL.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::num::NonZeroUsize;

use crate::agent::Agent;
use crate::config::{CliOverrides, Config, Settings};
use crate::output::StdoutRenderer;
use crate::provider::OpenAiSource;
use crate::tools::external::{ExternalFallback, ExternalTool};
use crate::tools::ToolRegistry;
use crate::{chat, prompts};

/// Top-level CLI structure for otto.
#[derive(Parser)]
#[command(name = "otto", about = "A streaming tool-calling coding agent", version)]
pub struct Cli {
    /// Print each tool call and a preview of its result
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Model to use (overrides environment and config)
    #[arg(short, long, global = true)]
    pub model: Option<String>,
    /// OpenAI-compatible endpoint (overrides environment and config)
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Stop a turn after this many model steps (at least 1)
    #[arg(long, global = true)]
    pub max_steps: Option<NonZeroUsize>,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands for the otto CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Run a single turn and exit
    Ask {
        /// The prompt to send
        prompt: Vec<String>,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the merged config (API key masked)
    Show,
}

/// Parses command-line arguments into a [`Cli`] struct.
///
/// Delegates to [`clap::Parser::parse`], which exits the process on invalid input.
pub fn parse() -> Cli {
    Cli::parse()
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            max_steps: self.max_steps,
            verbose: self.verbose,
        }
    }
}

/// Dispatches the parsed CLI command to its handler.
pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let overrides = cli.overrides();

    match cli.command {
        None => {
            let settings = Settings::resolve(&config, &overrides)?;
            let agent = build_agent(&config, &settings)?;
            chat::run_chat(agent, &settings.model, settings.verbose).await
        }
        Some(Commands::Ask { prompt }) => {
            let prompt = prompt.join(" ");
            if prompt.trim().is_empty() {
                anyhow::bail!("No prompt provided. Usage: otto ask \"your question here\"");
            }
            let settings = Settings::resolve(&config, &overrides)?;
            let mut agent = build_agent(&config, &settings)?;
            let mut renderer = StdoutRenderer::new(settings.verbose);

            tokio::select! {
                outcome = agent.prompt(&prompt, &mut renderer) => match outcome {
                    Ok(outcome) => {
                        tracing::debug!(steps = outcome.steps.len(), "turn complete");
                        Ok(())
                    }
                    Err(e) => Err(e.into()),
                },
                _ = tokio::signal::ctrl_c() => {
                    println!();
                    Ok(())
                }
            }
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => {
                let path = Config::config_path()?;
                println!("{} {}", "Config path:".bold(), path.display());
                println!();
                let toml_str = toml::to_string_pretty(&config.redacted())?;
                println!("{}", toml_str);
                Ok(())
            }
        },
    }
}

fn build_agent(config: &Config, settings: &Settings) -> Result<Agent> {
    let source = OpenAiSource::from_settings(settings)?;
    let root = std::env::current_dir()?;
    let system_prompt = prompts::system_prompt(config.system_prompt.as_deref(), &prompts::search_dirs());

    let mut tools = ToolRegistry::with_builtins(root.clone());
    for definition in &config.tools {
        tracing::debug!(name = %definition.name, "registering configured tool");
        tools.register(Box::new(ExternalTool::new(root.clone(), definition.clone())));
    }
    if let Some(command) = &config.fallback_command {
        tools.set_fallback(Box::new(ExternalFallback::new(root, command.clone())));
    }

    tracing::debug!(model = %settings.model, base_url = %settings.base_url, "starting agent");
    Ok(Agent::new(Box::new(source), tools, system_prompt, settings.max_steps)
        .with_idle_timeout(settings.stream_timeout))
}
