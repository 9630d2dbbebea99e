//! `rsufleet health`: probe `/health` on every managed instance.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::ports::ProcessRegistry as _;
use crate::application::services::health_checker::check_all;
use crate::output::progress;

/// Run `rsufleet health`. Exits 1 when any instance is not healthy.
///
/// # Errors
///
/// Returns an error if the registry cannot be read.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let instances = app.registry.list_all().await?;
    let timeout = app.config.health.timeout();

    let spinner = (app.output.show_progress() && !instances.is_empty())
        .then(|| progress::fleet_spinner("Checking", instances.len()));
    let report = check_all(&app.http, &app.signaller, &instances, timeout).await;
    if let Some(pb) = spinner {
        let msg = format!("{}/{} healthy", report.summary.healthy, report.summary.total());
        progress::finish(&pb, report.all_healthy(), &msg);
    }

    for inst in &report.instances {
        if let Some(failure) = inst.verdict.failure(&inst.id) {
            tracing::info!(instance = %inst.id, port = inst.port, error = %failure, "instance unhealthy");
        }
    }

    app.renderer().render_health(&report)?;
    if report.all_healthy() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
