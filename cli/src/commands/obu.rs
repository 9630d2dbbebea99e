//! `rsufleet obu`: manage simulated vehicle (OBU) processes.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use fleet_common::{EDGE_SERVERS_ENV, EDGE_SERVERS_FALLBACK_ENV, parse_vehicles};

use crate::app::AppContext;
use crate::application::ports::ManifestStore as _;
use crate::application::services::obu_fleet::{
    ObuLaunchSettings, edge_servers_from_manifest, list_obus, start_obus, stop_obus,
};
use crate::domain::obu::select_vehicles;
use crate::infra::process::TokioProcessSpawner;

/// Name of the simulated-client executable.
pub const OBU_RUNNER_BIN: &str = "obu-runner";

/// OBU subcommands.
#[derive(Subcommand)]
pub enum ObuCommand {
    /// Start one obu-runner per vehicle
    Start(ObuStartArgs),
    /// Stop every tracked obu-runner
    Stop,
    /// List tracked obu-runners
    List,
}

/// Arguments for `obu start`.
#[derive(Args)]
pub struct ObuStartArgs {
    /// JSON array of vehicles
    #[arg(long)]
    pub vehicles_file: PathBuf,

    /// Start only the first N vehicles
    #[arg(long, short = 'n')]
    pub count: Option<usize>,

    /// obu-runner executable (default: next to rsufleet, then PATH)
    #[arg(long, env = "RSU_FLEET_OBU_RUNNER")]
    pub runner: Option<PathBuf>,
}

/// Run an `obu` subcommand.
///
/// # Errors
///
/// Returns an error if the vehicles file cannot be read or the pid map
/// cannot be loaded or saved.
pub async fn run(app: &AppContext, cmd: ObuCommand) -> Result<ExitCode> {
    match cmd {
        ObuCommand::Start(args) => start(app, args).await,
        ObuCommand::Stop => {
            let report = stop_obus(&app.signaller, &app.registry, &app.reporter()).await?;
            app.renderer().render_obu_stop(&report)?;
            Ok(exit_for(report.failed.is_empty()))
        }
        ObuCommand::List => {
            let statuses = list_obus(&app.signaller, &app.registry).await?;
            app.renderer().render_obu_list(&statuses)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn start(app: &AppContext, args: ObuStartArgs) -> Result<ExitCode> {
    let content = std::fs::read_to_string(&args.vehicles_file)
        .with_context(|| format!("cannot read {}", args.vehicles_file.display()))?;
    let vehicles = select_vehicles(parse_vehicles(&content)?, args.count);
    if vehicles.is_empty() {
        app.output.info("No vehicles to start.");
        return Ok(ExitCode::SUCCESS);
    }

    let configured = [EDGE_SERVERS_ENV, EDGE_SERVERS_FALLBACK_ENV]
        .iter()
        .any(|k| app.inherited.get(*k).is_some_and(|v| !v.trim().is_empty()));
    let manifest = if configured {
        None
    } else {
        app.registry.load_manifest().await?
    };
    let edge_servers = edge_servers_from_manifest(configured, manifest.as_ref());

    let settings = ObuLaunchSettings {
        runner: resolve_runner(args.runner),
        cwd: std::env::current_dir().context("cannot determine current directory")?,
        logs_dir: app.layout.logs_dir(),
        startup_grace: app.config.worker.startup_grace(),
        inherited: app.inherited.clone(),
    };
    let report = start_obus(
        &TokioProcessSpawner,
        &app.signaller,
        &app.registry,
        &vehicles,
        &settings,
        edge_servers,
        &app.reporter(),
    )
    .await?;
    app.renderer().render_obu_start(&report)?;
    Ok(exit_for(report.failed.is_empty()))
}

/// Explicit path, else the binary installed next to `rsufleet`, else PATH.
fn resolve_runner(explicit: Option<PathBuf>) -> String {
    if let Some(path) = explicit {
        return path.display().to_string();
    }
    std::env::current_exe()
        .ok()
        .map(|exe| exe.with_file_name(format!("{OBU_RUNNER_BIN}{}", std::env::consts::EXE_SUFFIX)))
        .filter(|p| p.is_file())
        .map_or_else(|| OBU_RUNNER_BIN.to_string(), |p| p.display().to_string())
}

fn exit_for(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
