//! `rsufleet status` and `rsufleet list`: registry entries with liveness.
//!
//! Both are read-only: entries whose process died are flagged stale, never
//! removed.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;

/// Arguments for the status command.
#[derive(Args)]
pub struct StatusArgs {
    /// Instance id
    #[arg(long)]
    pub id: String,
}

/// Run `rsufleet status`.
///
/// # Errors
///
/// Returns `ProcessNotFound` for an unknown id.
pub async fn run(app: &AppContext, args: &StatusArgs) -> Result<ExitCode> {
    let status = app.fleet().status(&args.id).await?;
    app.renderer().render_status(&status)?;
    Ok(ExitCode::SUCCESS)
}

/// Run `rsufleet list`.
///
/// # Errors
///
/// Returns an error if the registry cannot be read.
pub async fn list(app: &AppContext) -> Result<ExitCode> {
    let statuses = app.fleet().list().await?;
    app.renderer().render_list(&statuses)?;
    Ok(ExitCode::SUCCESS)
}
