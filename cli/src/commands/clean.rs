//! `rsufleet clean`: archive the manifest and remove worker logs.

use std::process::ExitCode;

use anyhow::Result;
use chrono::Utc;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::cleanup::{CleanOptions, apply_clean, plan_clean};

/// Arguments for the clean command.
#[derive(Args)]
pub struct CleanArgs {
    /// Move deployment.json into the archive directory
    #[arg(long)]
    pub archive: bool,

    /// Remove every file in the logs directory
    #[arg(long)]
    pub logs: bool,

    /// Only print what would be done
    #[arg(long)]
    pub dry_run: bool,
}

/// Run `rsufleet clean`.
///
/// # Errors
///
/// Returns an error if the logs directory cannot be listed or the manifest
/// cannot be moved.
pub fn run(app: &AppContext, args: &CleanArgs) -> Result<ExitCode> {
    let opts = CleanOptions {
        archive: args.archive,
        logs: args.logs,
    };
    if opts.is_empty() {
        app.output
            .info("Nothing selected. Use --archive and/or --logs (add --dry-run to preview).");
        return Ok(ExitCode::SUCCESS);
    }

    let layout = &app.layout;
    let plan = plan_clean(
        &app.fs,
        opts,
        &layout.manifest(),
        &layout.archive_dir(),
        &layout.logs_dir(),
        Utc::now(),
    )?;
    if !args.dry_run {
        apply_clean(&app.fs, &plan, &app.reporter())?;
    }
    app.renderer().render_clean(&plan, args.dry_run)?;
    Ok(ExitCode::SUCCESS)
}
