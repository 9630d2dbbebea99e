//! `TerminalReporter`, the terminal side of `ProgressReporter`.
//!
//! Lines go to stderr so `--json` documents on stdout stay parseable. Every
//! event is also emitted as a `tracing` event, which keeps a record of
//! deploy progress under `-v` even when the terminal lines are suppressed.

use owo_colors::OwoColorize as _;
use owo_colors::Style;

use crate::application::ports::ProgressReporter;
use crate::output::OutputContext;

pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
}

impl<'a> TerminalReporter<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    fn line(&self, marker: &str, style: Style, message: &str) {
        if !self.ctx.quiet {
            eprintln!("  {} {message}", marker.style(style));
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        tracing::debug!(step = message);
        self.line("→", self.ctx.styles.info, message);
    }

    fn success(&self, message: &str) {
        tracing::info!(outcome = "ok", "{message}");
        self.line("✓", self.ctx.styles.success, message);
    }

    fn warn(&self, message: &str) {
        tracing::info!(outcome = "warn", "{message}");
        self.line("⚠", self.ctx.styles.warning, message);
    }
}
