//! `rsufleet logs`: show the worker log files of one instance.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::logs::{DEFAULT_LOG_CHARS, instance_logs};

/// Arguments for the logs command.
#[derive(Args)]
pub struct LogsArgs {
    /// Instance id
    #[arg(long)]
    pub id: String,

    /// Characters shown per log file
    #[arg(long, default_value_t = DEFAULT_LOG_CHARS)]
    pub max_bytes: usize,
}

/// Run `rsufleet logs`.
///
/// # Errors
///
/// Returns an error if the logs directory cannot be listed.
pub fn run(app: &AppContext, args: &LogsArgs) -> Result<ExitCode> {
    crate::domain::validate_instance_id(&args.id)?;
    let excerpts = instance_logs(&app.fs, &app.layout.logs_dir(), &args.id, args.max_bytes)?;
    app.renderer().render_logs(&args.id, &excerpts)?;
    Ok(ExitCode::SUCCESS)
}
