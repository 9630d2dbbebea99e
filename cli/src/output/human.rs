//! Human-readable terminal renderer.

use std::path::Path;

use owo_colors::OwoColorize as _;

use crate::application::services::cleanup::CleanPlan;
use crate::application::services::fleet::{StopAllReport, StopOutcome, StopReport};
use crate::application::services::logs::LogExcerpt;
use crate::application::services::obu_fleet::{ObuStartReport, ObuStatus, ObuStopReport};
use crate::domain::config::FleetConfig;
use crate::domain::{
    DeployReport, HealthReport, HealthVerdict, Instance, InstanceStage, InstanceStatus,
    RegistrationOutcome,
};
use crate::output::OutputContext;

/// Fields of `/api/stats` shown by `rsufleet stats`.
pub const STATS_FIELDS: &[&str] = &[
    "edgeServerAddress",
    "blockchainNetwork",
    "currentBlockNumber",
    "vehicleRegistryAddress",
    "alertSystemAddress",
    "totalAlertsOnChain",
    "uptime",
];

/// Renders fleet types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        println!("rsufleet {version}");
    }

    /// Render the end-of-deploy summary. Per-instance progress was already
    /// printed while the deploy ran.
    pub fn render_deploy(&self, report: &DeployReport) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.header("Deployment summary:");
        for outcome in &report.instances {
            let line = match outcome.stage {
                InstanceStage::Skipped => format!(
                    "{:<6} port {:<6} skipped: {}",
                    outcome.id,
                    outcome.port,
                    outcome.error.as_deref().unwrap_or("unknown reason")
                ),
                _ => format!(
                    "{:<6} port {:<6} pid {:<8} {}",
                    outcome.id,
                    outcome.port,
                    outcome.pid.map(|p| p.to_string()).unwrap_or_default(),
                    registration_display(
                        outcome.registration.as_ref().map(|r| r.outcome()).as_ref()
                    )
                ),
            };
            if outcome.is_recorded() {
                self.ctx.success(&line);
            } else {
                self.ctx.warn(&line);
            }
        }
        println!();
        self.ctx.info(&format!(
            "Deployed {}/{} instance(s); registration: {} succeeded, {} failed",
            report.deployed, report.requested, report.registered, report.registration_failed
        ));
        if let Some(generation) = report.generation {
            self.ctx.info(&format!("Manifest generation {generation} written"));
        }
    }

    pub fn render_started(&self, instance: &Instance) {
        self.ctx.success(&format!(
            "Instance {} started on {} (pid {})",
            instance.id,
            instance.url(),
            instance.pid
        ));
        if let Some(log) = &instance.log_file {
            self.ctx.kv("Log:", &log.display().to_string());
        }
    }

    pub fn render_stop(&self, report: &StopReport) {
        self.ctx.success(&stop_line(report));
    }

    pub fn render_stop_all(&self, report: &StopAllReport) {
        if report.stopped.is_empty() && report.failed.is_empty() {
            self.ctx.info("No managed instances.");
            return;
        }
        self.ctx.info(&format!(
            "Stopped {} instance(s), {} failed",
            report.stopped.len(),
            report.failed.len()
        ));
    }

    pub fn render_status(&self, status: &InstanceStatus) {
        let inst = &status.instance;
        self.ctx.kv("Instance:", &inst.id);
        self.ctx.kv("URL:", &inst.url());
        self.ctx.kv("PID:", &inst.pid.to_string());
        self.ctx.kv("Process:", liveness_display(status.alive));
        self.ctx.kv(
            "Started:",
            &inst.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
        self.ctx.kv(
            "Registration:",
            &registration_display(inst.registration.as_ref()),
        );
        if status.is_stale() {
            self.ctx.warn(&format!(
                "Process {} is gone. Remove the entry: rsufleet stop --id {}",
                inst.pid, inst.id
            ));
        }
    }

    pub fn render_list(&self, statuses: &[InstanceStatus]) {
        if statuses.is_empty() {
            self.ctx
                .info("No managed instances. Deploy some: rsufleet deploy --count 3 --start-port 3000");
            return;
        }
        println!(
            "  {:<8} {:<7} {:<9} {:<8} {:<24} {}",
            "ID".style(self.ctx.styles.bold),
            "PORT".style(self.ctx.styles.bold),
            "PID".style(self.ctx.styles.bold),
            "STATE".style(self.ctx.styles.bold),
            "URL".style(self.ctx.styles.bold),
            "REGISTRATION".style(self.ctx.styles.bold),
        );
        for status in statuses {
            let inst = &status.instance;
            let label = liveness_display(status.alive);
            let state = label.style(self.ctx.styles.liveness(status.alive));
            println!(
                "  {:<8} {:<7} {:<9} {state:<8} {:<24} {}",
                inst.id,
                inst.port,
                inst.pid,
                inst.url().style(self.ctx.styles.endpoint),
                registration_display(inst.registration.as_ref()),
            );
        }
        let stale = statuses.iter().filter(|s| s.is_stale()).count();
        if stale > 0 {
            println!();
            self.ctx.warn(&format!(
                "{stale} stale entr{} (process gone); stop them to clean up",
                if stale == 1 { "y" } else { "ies" }
            ));
        }
    }

    pub fn render_logs(&self, id: &str, excerpts: &[LogExcerpt]) {
        if excerpts.is_empty() {
            self.ctx.info(&format!("No log files for instance {id}."));
            return;
        }
        for excerpt in excerpts {
            self.ctx.header(&format!("{}:", excerpt.path.display()));
            println!("{}", excerpt.text);
            if excerpt.truncated {
                self.ctx.info("(truncated)");
            }
        }
    }

    pub fn render_health(&self, report: &HealthReport) {
        if report.instances.is_empty() {
            self.ctx.info("No managed instances to check.");
            return;
        }
        for inst in &report.instances {
            let mut line = format!("{:<6} {:<24} {}", inst.id, inst.url, inst.verdict.label());
            match &inst.verdict {
                HealthVerdict::Healthy(_) => {
                    self.ctx.success(&line);
                    continue;
                }
                HealthVerdict::Unreachable(cause) | HealthVerdict::Error(cause) => {
                    line.push_str(&format!(": {cause}"));
                }
            }
            if !inst.alive {
                line.push_str(" (process gone)");
            }
            println!("  {} {line}", "✗".style(self.ctx.styles.error));
        }
        let s = &report.summary;
        println!();
        self.ctx.info(&format!(
            "{} healthy, {} unreachable, {} error",
            s.healthy, s.unreachable, s.error
        ));
    }

    pub fn render_stats(&self, id: &str, stats: &serde_json::Value) {
        self.ctx.header(&format!("Instance {id} stats:"));
        for (key, value) in stats_fields(stats) {
            self.ctx.kv(&format!("{key}:"), &value);
        }
    }

    pub fn render_obu_start(&self, report: &ObuStartReport) {
        self.ctx.info(&format!(
            "{} started, {} already running, {} failed",
            report.started.len(),
            report.skipped.len(),
            report.failed.len()
        ));
    }

    pub fn render_obu_stop(&self, report: &ObuStopReport) {
        if report.stopped.is_empty() && report.failed.is_empty() {
            self.ctx.info("No tracked OBU processes.");
            return;
        }
        self.ctx.info(&format!(
            "{} stopped, {} failed",
            report.stopped.len(),
            report.failed.len()
        ));
    }

    pub fn render_obu_list(&self, statuses: &[ObuStatus]) {
        if statuses.is_empty() {
            self.ctx.info("No tracked OBU processes.");
            return;
        }
        for status in statuses {
            let line = format!(
                "{:<16} pid {:<8} {}",
                status.vehicle_id,
                status.pid,
                liveness_display(status.alive)
            );
            if status.alive {
                self.ctx.success(&line);
            } else {
                self.ctx.warn(&line);
            }
        }
    }

    pub fn render_clean(&self, plan: &CleanPlan, dry_run: bool) {
        if plan.is_empty() {
            self.ctx.info("Nothing to clean.");
            return;
        }
        if !dry_run {
            return;
        }
        if let Some((from, to)) = &plan.archive {
            self.ctx
                .info(&format!("would archive {} -> {}", from.display(), to.display()));
        }
        for file in &plan.remove_logs {
            self.ctx.info(&format!("would remove {}", file.display()));
        }
    }

    /// Render the effective configuration.
    pub fn render_config(&self, config: &FleetConfig, path: &Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        println!("  {:<28} {}", "worker.dir:", config.worker.dir.display());
        println!(
            "  {:<28} {} {}",
            "worker.command:",
            config.worker.program,
            config.worker.args.join(" ")
        );
        println!("  {:<28} {}", "worker.env_file:", config.worker.env_file_path().display());
        println!("  {:<28} {}", "worker.install:", config.worker.install.join(" "));
        println!("  {:<28} {}ms", "worker.startup_grace_ms:", config.worker.startup_grace_ms);
        println!(
            "  {:<28} {} {}",
            "registrar.command:",
            config.registrar.program,
            config.registrar.script.display()
        );
        println!("  {:<28} {}s", "registrar.timeout_secs:", config.registrar.timeout_secs);
        println!(
            "  {:<28} {}",
            "registrar.fund_amount:",
            config.registrar.fund_amount.as_deref().unwrap_or("(none)")
        );
        println!("  {:<28} {}ms", "health.timeout_ms:", config.health.timeout_ms);
        println!("  {:<28} {}", "deploy.parallelism:", config.deploy.parallelism);
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in [
            "RSU_FLEET_CONFIG",
            "RSU_FLEET_STATE_DIR",
            "RSU_FLEET_WORKER_DIR",
            "FUND_AMOUNT",
            "NO_COLOR",
        ] {
            println!(
                "    {:<22} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
        println!(
            "    {:<22} {}",
            "ADMIN_PRIVATE_KEY:",
            if std::env::var_os("ADMIN_PRIVATE_KEY").is_some() {
                "(set)"
            } else {
                "(not set)"
            }
        );
        println!();
    }
}

// ── Display helpers (used by tests and output layer) ─────────────────────────

#[must_use]
pub fn liveness_display(alive: bool) -> &'static str {
    if alive { "running" } else { "stale" }
}

#[must_use]
pub fn registration_display(outcome: Option<&RegistrationOutcome>) -> String {
    match outcome {
        None => "not registered".to_string(),
        Some(RegistrationOutcome {
            success: true,
            tx_hash: Some(tx),
            ..
        }) => format!("registered (tx {tx})"),
        Some(RegistrationOutcome { success: true, .. }) => "registered".to_string(),
        Some(RegistrationOutcome {
            error: Some(err), ..
        }) => format!("registration failed: {err}"),
        Some(_) => "registration failed".to_string(),
    }
}

#[must_use]
pub fn stop_line(report: &StopReport) -> String {
    match report.outcome {
        StopOutcome::Terminated => format!(
            "Stopped instance {} (pid {}, port {})",
            report.id, report.pid, report.port
        ),
        StopOutcome::AlreadyExited => format!(
            "Instance {} (pid {}) had already exited; entry removed",
            report.id, report.pid
        ),
    }
}

/// The displayed `/api/stats` fields, in order; missing ones read `n/a`.
#[must_use]
pub fn stats_fields(stats: &serde_json::Value) -> Vec<(&'static str, String)> {
    STATS_FIELDS
        .iter()
        .map(|key| {
            let value = match stats.get(*key) {
                None | Some(serde_json::Value::Null) => "n/a".to_string(),
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            };
            (*key, value)
        })
        .collect()
}
