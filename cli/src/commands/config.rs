//! `rsufleet config`: show the effective configuration.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::ports::ConfigStore as _;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show effective configuration and its source path
    Show,
}

/// Run the config command.
///
/// # Errors
///
/// JSON serialization failures.
pub fn run(app: &AppContext, cmd: &ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show => {
            app.renderer()
                .render_config(&app.config, &app.config_store.path())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
