//! Interactive chat REPL for otto.
//!
//! Reads one prompt per line with [`rustyline`] and runs it as a turn on the
//! [`Agent`]. The agent keeps the transcript across turns, so the model sees
//! all prior context, tool calls and results included.

use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::Path;

use crate::agent::Agent;
use crate::config::Config;
use crate::constants::USER_PROMPT;
use crate::output::{Renderer, StdoutRenderer};

/// Runs the interactive chat REPL.
///
/// # Readline behavior
///
/// - **Ctrl+C** or **Ctrl+D** at the prompt: exits cleanly
/// - **Ctrl+C** during a turn: abandons the turn and exits cleanly
/// - Readline history is persisted to `~/.cache/otto/history.txt`
pub async fn run_chat(mut agent: Agent, model: &str, verbose: bool) -> Result<()> {
    println!(
        "{} [model: {}] (Ctrl+C to exit)",
        "otto".bold().cyan(),
        model.yellow(),
    );
    println!();

    let mut rl = DefaultEditor::new()?;
    let history_path = Config::history_path()?;
    if history_path.exists() {
        let _ = rl.load_history(&history_path);
    }

    let mut renderer = StdoutRenderer::new(verbose);

    loop {
        let line = match rl.readline(USER_PROMPT) {
            Ok(line) => line.trim().to_string(),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(e) => {
                save_history(&mut rl, &history_path);
                return Err(e.into());
            }
        };
        if line.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(&line);

        tokio::select! {
            outcome = agent.prompt(&line, &mut renderer) => match outcome {
                Ok(outcome) => {
                    tracing::debug!(
                        steps = outcome.steps.len(),
                        messages = outcome.transcript_len,
                        "turn complete"
                    );
                }
                Err(e) => {
                    tracing::debug!(messages = agent.transcript().len(), "turn aborted");
                    renderer.render_error(&e.to_string());
                }
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("{}", "interrupted.".dimmed());
                break;
            }
        }
    }

    save_history(&mut rl, &history_path);
    Ok(())
}

fn save_history(rl: &mut DefaultEditor, path: &Path) {
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    if let Err(e) = rl.save_history(path) {
        tracing::debug!(error = %e, "could not save readline history");
    }
}
