//! `rsufleet stop` and `rsufleet stop-all`.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;

/// Arguments for the stop command.
#[derive(Args)]
pub struct StopArgs {
    /// Instance id to stop
    #[arg(long)]
    pub id: String,
}

/// Run `rsufleet stop`.
///
/// # Errors
///
/// Returns `ProcessNotFound` for an unknown id, or the signal error when
/// the OS rejects the termination request.
pub async fn run(app: &AppContext, args: &StopArgs) -> Result<ExitCode> {
    let report = app.fleet().stop(&args.id).await?;
    app.renderer().render_stop(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Run `rsufleet stop-all`. Exits 1 when any instance could not be stopped.
///
/// # Errors
///
/// Returns an error if the registry cannot be read or the manifest cannot
/// be rewritten.
pub async fn run_all(app: &AppContext) -> Result<ExitCode> {
    let report = app.fleet().stop_all(&app.reporter()).await?;
    app.renderer().render_stop_all(&report)?;
    if report.failed.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
