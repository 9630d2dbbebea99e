//! `rsufleet start`: launch one edge server with a chosen id and port.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;

/// Arguments for the start command.
#[derive(Args)]
pub struct StartArgs {
    /// Instance id (letters, digits, `-`, `_`)
    #[arg(long)]
    pub id: String,

    /// Port the instance listens on
    #[arg(long, short = 'p')]
    pub port: u16,
}

/// Run `rsufleet start`.
///
/// # Errors
///
/// Returns an error if the id is invalid or already managed, the port is
/// unavailable, or the worker fails to launch.
pub async fn run(app: &AppContext, args: &StartArgs) -> Result<ExitCode> {
    let instance = app.fleet().start(&args.id, args.port).await?;
    app.renderer().render_started(&instance)?;
    Ok(ExitCode::SUCCESS)
}
