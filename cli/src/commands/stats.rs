//! `rsufleet stats`: on-chain statistics reported by one instance.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::{ProcessRegistry as _, StatsClient as _};
use crate::domain::FleetError;

/// Arguments for the stats command.
#[derive(Args)]
pub struct StatsArgs {
    /// Instance id
    pub id: String,
}

/// Run `rsufleet stats`.
///
/// # Errors
///
/// Returns `ProcessNotFound` for an unknown id, or an error when the
/// instance does not answer with JSON.
pub async fn run(app: &AppContext, args: &StatsArgs) -> Result<ExitCode> {
    let instance = app
        .registry
        .lookup(&args.id)
        .await?
        .ok_or_else(|| FleetError::ProcessNotFound(args.id.clone()))?;
    let stats = app
        .http
        .fetch_stats(&instance.url())
        .await
        .with_context(|| format!("Cannot fetch stats from instance {}", instance.id))?;
    app.renderer().render_stats(&instance.id, &stats)?;
    Ok(ExitCode::SUCCESS)
}
