//! Application service: deploy preflight.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::time::Duration;

use anyhow::Result;

use crate::application::ports::{CommandRunner, Invocation, LocalFs, ProgressReporter};
use crate::domain::config::WorkerConfig;
use crate::domain::registration::{MAX_ERROR_DETAIL, truncate_detail};

/// Bound for the runtime version probe.
pub const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Bound for the dependency install step.
pub const INSTALL_TIMEOUT: Duration = Duration::from_secs(300);

/// What preflight found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightReport {
    /// Runtime version string, `None` when the probe failed.
    pub runtime_version: Option<String>,
    /// Whether the install step ran.
    pub installed: bool,
}

/// Probe the worker runtime and install dependencies when missing.
///
/// A missing runtime only warns: every launch will then fail on its own.
///
/// # Errors
///
/// Returns an error when the install command fails or times out.
pub async fn run_preflight(
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    worker: &WorkerConfig,
    reporter: &impl ProgressReporter,
) -> Result<PreflightReport> {
    let probe = Invocation::new(&worker.program, ["--version"]);
    let runtime_version = match runner.run(&probe, VERSION_PROBE_TIMEOUT).await {
        Ok(out) if out.status.success() => {
            let version = String::from_utf8_lossy(&out.stdout).trim().to_string();
            reporter.success(&format!("{} {version} found", worker.program));
            Some(version)
        }
        Ok(out) => {
            reporter.warn(&format!(
                "'{} --version' exited with {}; launches will likely fail",
                worker.program, out.status
            ));
            None
        }
        Err(e) => {
            tracing::warn!(program = %worker.program, error = %e, "runtime probe failed");
            reporter.warn(&format!(
                "'{}' is not available; launches will likely fail",
                worker.program
            ));
            None
        }
    };

    let marker = worker.dir.join(&worker.dependencies_marker);
    let Some((program, args)) = worker.install.split_first() else {
        return Ok(PreflightReport {
            runtime_version,
            installed: false,
        });
    };
    if fs.exists(&marker) {
        return Ok(PreflightReport {
            runtime_version,
            installed: false,
        });
    }

    reporter.step(&format!(
        "installing worker dependencies ({})",
        worker.install.join(" ")
    ));
    let invocation = Invocation {
        program: program.clone(),
        args: args.to_vec(),
        cwd: Some(worker.dir.clone()),
        env: Vec::new(),
    };
    let out = runner.run(&invocation, INSTALL_TIMEOUT).await?;
    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        anyhow::bail!(
            "dependency install failed ({}): {}",
            out.status,
            truncate_detail(&stderr, MAX_ERROR_DETAIL)
        );
    }
    reporter.success("worker dependencies installed");
    Ok(PreflightReport {
        runtime_version,
        installed: true,
    })
}
