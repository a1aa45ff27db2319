//! Output rendering abstraction for otto.
//!
//! Defines the [`Renderer`] trait that decouples the turn loop from the
//! display. [`StdoutRenderer`] echoes streamed tokens to the terminal and, in
//! verbose mode, prints one diagnostic line per tool call and result.

use colored::Colorize;
use std::io::{self, Write};

use crate::constants::RESULT_PREVIEW_CHARS;
use crate::message::{ToolInvocation, ToolResult};

/// Trait for rendering agent output.
pub trait Renderer {
    /// Render a single text fragment as it arrives.
    fn render_token(&mut self, token: &str);

    /// Called when a streamed step is complete.
    fn render_done(&mut self);

    /// Called when an error ends a turn.
    fn render_error(&mut self, err: &str);

    /// Called before a tool call is dispatched.
    fn tool_call(&mut self, _call: &ToolInvocation) {}

    /// Called after a tool result is produced.
    fn tool_result(&mut self, _result: &ToolResult) {}

    /// Called when the turn loops back for another step.
    fn step_continue(&mut self) {}
}

/// Renders streaming output directly to stdout.
///
/// Each token is printed immediately with an explicit flush so the user
/// sees a "typing" effect.
pub struct StdoutRenderer {
    verbose: bool,
    wrote_text: bool,
}

impl StdoutRenderer {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            wrote_text: false,
        }
    }
}

impl Renderer for StdoutRenderer {
    fn render_token(&mut self, token: &str) {
        print!("{}", token);
        // Flush immediately so each token appears as it arrives
        io::stdout().flush().ok();
        self.wrote_text = true;
    }

    fn render_done(&mut self) {
        if self.wrote_text {
            println!();
            self.wrote_text = false;
        }
    }

    fn render_error(&mut self, err: &str) {
        eprintln!();
        eprintln!("{} {}", "error:".red().bold(), err);
    }

    fn tool_call(&mut self, call: &ToolInvocation) {
        if self.verbose {
            println!(
                "{} call -> {} args={:?}",
                "[tool]".yellow(),
                call.name,
                call.arguments
            );
        }
    }

    fn tool_result(&mut self, result: &ToolResult) {
        if self.verbose {
            let content = result.content();
            let label = status_label(result);
            let label = if result.is_ok() { label.green() } else { label.red() };
            println!("{} result <- [{}] {}", "[tool]".yellow(), label, preview(&content));
        }
    }

    fn step_continue(&mut self) {
        if self.verbose {
            println!("{}", "[turn] continuing after tool results".dimmed());
            println!();
        }
    }
}

/// Discards everything.
#[cfg(test)]
pub struct NullRenderer;

#[cfg(test)]
impl Renderer for NullRenderer {
    fn render_token(&mut self, _token: &str) {}
    fn render_done(&mut self) {}
    fn render_error(&mut self, _err: &str) {}
}

fn status_label(result: &ToolResult) -> &'static str {
    if result.is_ok() {
        "ok"
    } else if result.is_unknown_operation() {
        "unknown"
    } else {
        "failed"
    }
}

/// First [`RESULT_PREVIEW_CHARS`] characters of `text`.
pub fn preview(text: &str) -> &str {
    match text.char_indices().nth(RESULT_PREVIEW_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
