//! `rsufleet lb-config` and `rsufleet docker-config`: render the current
//! manifest as an nginx upstream or a compose file.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::ManifestStore as _;
use crate::domain::InstanceSnapshot;
use crate::domain::projection::{render_compose, render_nginx_upstream};

/// Arguments shared by the projection commands.
#[derive(Args)]
pub struct ProjectionArgs {
    /// Write to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Run `rsufleet lb-config`.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or the output file
/// cannot be written.
pub async fn lb_config(app: &AppContext, args: &ProjectionArgs) -> Result<ExitCode> {
    project(app, args, render_nginx_upstream).await
}

/// Run `rsufleet docker-config`.
///
/// # Errors
///
/// Same as [`lb_config`].
pub async fn docker_config(app: &AppContext, args: &ProjectionArgs) -> Result<ExitCode> {
    project(app, args, render_compose).await
}

async fn project(
    app: &AppContext,
    args: &ProjectionArgs,
    render: fn(&[InstanceSnapshot]) -> String,
) -> Result<ExitCode> {
    let manifest = app.registry.load_manifest().await?;
    let Some(manifest) = manifest.filter(|m| !m.is_empty()) else {
        app.output
            .info("No deployment found. Deploy first: rsufleet deploy --count 3 --start-port 3000");
        return Ok(ExitCode::SUCCESS);
    };
    let text = render(&manifest.instances);
    match &args.output {
        Some(path) => {
            write_output(path, &text)?;
            app.output.success(&format!(
                "Wrote {} ({} instance(s))",
                path.display(),
                manifest.instances.len()
            ));
        }
        None => print!("{text}"),
    }
    Ok(ExitCode::SUCCESS)
}

fn write_output(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))
}
