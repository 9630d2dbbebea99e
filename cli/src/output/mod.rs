//! Output formatting module

pub mod human;
pub mod json;
pub mod progress;
pub mod reporter;
pub mod styles;

use std::path::Path;

use anyhow::Result;
use console::Term;
use owo_colors::OwoColorize as _;
pub use human::HumanRenderer;
pub use json::JsonRenderer;
pub use reporter::TerminalReporter;
pub use styles::Styles;

use crate::application::services::cleanup::CleanPlan;
use crate::application::services::fleet::{StopAllReport, StopReport};
use crate::application::services::logs::LogExcerpt;
use crate::application::services::obu_fleet::{ObuStartReport, ObuStatus, ObuStopReport};
use crate::domain::config::FleetConfig;
use crate::domain::{DeployReport, HealthReport, Instance, InstanceStatus};

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Check if progress indicators should be shown.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// Print a warning message prefixed with `⚠`. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// Print an error message prefixed with `✗` to stderr. Never suppressed.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    /// Print an info message prefixed with `ℹ`. Suppressed when `quiet`.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "ℹ".style(self.styles.info));
        }
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when `quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }
}

/// Output renderer for the active mode.
///
/// Commands hand results to the renderer and never branch on `--json`
/// themselves.
pub enum Renderer<'a> {
    Human(HumanRenderer<'a>),
    Json(JsonRenderer),
}

impl Renderer<'_> {
    /// # Errors
    ///
    /// JSON serialization failures; human rendering never fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        match self {
            Self::Human(r) => r.render_version(version),
            Self::Json(_) => JsonRenderer::print(&serde_json::json!({ "version": version }))?,
        }
        Ok(())
    }

    /// # Errors
    ///
    /// JSON serialization failures.
    pub fn render_deploy(&self, report: &DeployReport) -> Result<()> {
        match self {
            Self::Human(r) => r.render_deploy(report),
            Self::Json(_) => JsonRenderer::print(report)?,
        }
        Ok(())
    }

    /// # Errors
    ///
    /// JSON serialization failures.
    pub fn render_started(&self, instance: &Instance) -> Result<()> {
        match self {
            Self::Human(r) => r.render_started(instance),
            Self::Json(_) => JsonRenderer::print(instance)?,
        }
        Ok(())
    }

    /// # Errors
    ///
    /// JSON serialization failures.
    pub fn render_stop(&self, report: &StopReport) -> Result<()> {
        match self {
            Self::Human(r) => r.render_stop(report),
            Self::Json(_) => JsonRenderer::print(report)?,
        }
        Ok(())
    }

    /// # Errors
    ///
    /// JSON serialization failures.
    pub fn render_stop_all(&self, report: &StopAllReport) -> Result<()> {
        match self {
            Self::Human(r) => r.render_stop_all(report),
            Self::Json(_) => JsonRenderer::print(report)?,
        }
        Ok(())
    }

    /// # Errors
    ///
    /// JSON serialization failures.
    pub fn render_status(&self, status: &InstanceStatus) -> Result<()> {
        match self {
            Self::Human(r) => r.render_status(status),
            Self::Json(_) => JsonRenderer::print(status)?,
        }
        Ok(())
    }

    /// # Errors
    ///
    /// JSON serialization failures.
    pub fn render_list(&self, statuses: &[InstanceStatus]) -> Result<()> {
        match self {
            Self::Human(r) => r.render_list(statuses),
            Self::Json(_) => JsonRenderer::print(&serde_json::json!({ "instances": statuses }))?,
        }
        Ok(())
    }

    /// # Errors
    ///
    /// JSON serialization failures.
    pub fn render_logs(&self, id: &str, excerpts: &[LogExcerpt]) -> Result<()> {
        match self {
            Self::Human(r) => r.render_logs(id, excerpts),
            Self::Json(_) => {
                let files: Vec<_> = excerpts
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "path": e.path,
                            "text": e.text,
                            "truncated": e.truncated,
                        })
                    })
                    .collect();
                JsonRenderer::print(&serde_json::json!({ "id": id, "files": files }))?;
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// JSON serialization failures.
    pub fn render_health(&self, report: &HealthReport) -> Result<()> {
        match self {
            Self::Human(r) => r.render_health(report),
            Self::Json(_) => JsonRenderer::print(report)?,
        }
        Ok(())
    }

    /// # Errors
    ///
    /// JSON serialization failures.
    pub fn render_stats(&self, id: &str, stats: &serde_json::Value) -> Result<()> {
        match self {
            Self::Human(r) => r.render_stats(id, stats),
            Self::Json(_) => JsonRenderer::print(stats)?,
        }
        Ok(())
    }

    /// # Errors
    ///
    /// JSON serialization failures.
    pub fn render_obu_start(&self, report: &ObuStartReport) -> Result<()> {
        match self {
            Self::Human(r) => r.render_obu_start(report),
            Self::Json(_) => JsonRenderer::print(report)?,
        }
        Ok(())
    }

    /// # Errors
    ///
    /// JSON serialization failures.
    pub fn render_obu_stop(&self, report: &ObuStopReport) -> Result<()> {
        match self {
            Self::Human(r) => r.render_obu_stop(report),
            Self::Json(_) => JsonRenderer::print(report)?,
        }
        Ok(())
    }

    /// # Errors
    ///
    /// JSON serialization failures.
    pub fn render_obu_list(&self, statuses: &[ObuStatus]) -> Result<()> {
        match self {
            Self::Human(r) => r.render_obu_list(statuses),
            Self::Json(_) => JsonRenderer::print(&serde_json::json!({ "obus": statuses }))?,
        }
        Ok(())
    }

    /// # Errors
    ///
    /// JSON serialization failures.
    pub fn render_clean(&self, plan: &CleanPlan, dry_run: bool) -> Result<()> {
        match self {
            Self::Human(r) => r.render_clean(plan, dry_run),
            Self::Json(_) => {
                JsonRenderer::print(&serde_json::json!({ "dry_run": dry_run, "plan": plan }))?;
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// JSON serialization failures.
    pub fn render_config(&self, config: &FleetConfig, path: &Path) -> Result<()> {
        match self {
            Self::Human(r) => r.render_config(config, path),
            Self::Json(_) => {
                JsonRenderer::print(&serde_json::json!({ "path": path, "config": config }))?;
            }
        }
        Ok(())
    }
}
