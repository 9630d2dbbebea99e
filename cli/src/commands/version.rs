//! Version command

use std::process::ExitCode;

use anyhow::Result;

use crate::output::Renderer;

/// Run the version command. Needs no state directory.
///
/// # Errors
///
/// JSON serialization failures.
pub fn run(renderer: &Renderer<'_>) -> Result<ExitCode> {
    renderer.render_version(env!("CARGO_PKG_VERSION"))?;
    Ok(ExitCode::SUCCESS)
}
