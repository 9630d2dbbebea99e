//! Application service: simulated-client (OBU) fleet.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use fleet_common::{EDGE_SERVERS_ENV, Vehicle};
use serde::Serialize;

use crate::application::ports::{
    ObuStore, ProcessSignaller, ProcessSpawner, ProcessSpec, ProgressReporter, SignalOutcome,
};
use crate::domain::DeploymentManifest;
use crate::domain::env::EnvMap;
use crate::domain::obu::{log_stem, runner_args};

/// How `obu-runner` processes are started.
#[derive(Debug, Clone)]
pub struct ObuLaunchSettings {
    /// Path or name of the `obu-runner` executable.
    pub runner: String,
    pub cwd: PathBuf,
    pub logs_dir: PathBuf,
    pub startup_grace: Duration,
    /// Environment every runner starts from.
    pub inherited: EnvMap,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ObuStartReport {
    pub started: Vec<ObuEntry>,
    /// Vehicles already tracked and alive.
    pub skipped: Vec<String>,
    pub failed: Vec<ObuFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObuEntry {
    pub vehicle_id: String,
    pub pid: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObuFailure {
    pub vehicle_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ObuStopReport {
    pub stopped: Vec<ObuEntry>,
    pub failed: Vec<ObuFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObuStatus {
    pub vehicle_id: String,
    pub pid: u32,
    pub alive: bool,
}

/// Edge-server list derived from the manifest, used only when the operator
/// configured none.
#[must_use]
pub fn edge_servers_from_manifest(
    configured: bool,
    manifest: Option<&DeploymentManifest>,
) -> Option<String> {
    if configured {
        return None;
    }
    let urls = manifest.map(DeploymentManifest::urls).unwrap_or_default();
    (!urls.is_empty()).then(|| urls.join(","))
}

/// Start one detached runner per vehicle and track its pid.
///
/// # Errors
///
/// Returns an error only when the pid map cannot be loaded or saved.
pub async fn start_obus(
    spawner: &impl ProcessSpawner,
    signaller: &impl ProcessSignaller,
    store: &impl ObuStore,
    vehicles: &[Vehicle],
    settings: &ObuLaunchSettings,
    edge_servers: Option<String>,
    reporter: &impl ProgressReporter,
) -> Result<ObuStartReport> {
    let mut pids = store.load_obus().await?;
    let mut report = ObuStartReport::default();
    let mut env = settings.inherited.clone();
    if let Some(servers) = edge_servers {
        env.insert(EDGE_SERVERS_ENV.to_string(), servers);
    }

    for vehicle in vehicles {
        let vid = &vehicle.vehicle_id;
        if let Some(&pid) = pids.get(vid)
            && signaller.is_alive(pid)
        {
            reporter.warn(&format!("{vid} already running (pid {pid}), skipping"));
            report.skipped.push(vid.clone());
            continue;
        }
        let spec = ProcessSpec {
            program: settings.runner.clone(),
            args: runner_args(vehicle),
            cwd: settings.cwd.clone(),
            env: env.clone(),
            log_file: settings.logs_dir.join(format!("obu_{}.log", log_stem(vid))),
            startup_grace: settings.startup_grace,
        };
        match spawner.spawn_detached(&spec).await {
            Ok(pid) => {
                tracing::info!(vehicle = %vid, pid, "obu started");
                reporter.success(&format!("started {vid} (pid {pid})"));
                pids.insert(vid.clone(), pid);
                report.started.push(ObuEntry {
                    vehicle_id: vid.clone(),
                    pid,
                });
            }
            Err(e) => {
                reporter.warn(&format!("{vid}: {e}"));
                report.failed.push(ObuFailure {
                    vehicle_id: vid.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    store.save_obus(&pids).await?;
    Ok(report)
}

/// Signal every tracked runner; accepted or already-gone entries are dropped.
///
/// # Errors
///
/// Returns an error only when the pid map cannot be loaded or saved.
pub async fn stop_obus(
    signaller: &impl ProcessSignaller,
    store: &impl ObuStore,
    reporter: &impl ProgressReporter,
) -> Result<ObuStopReport> {
    let mut pids = store.load_obus().await?;
    let mut report = ObuStopReport::default();
    for (vid, pid) in pids.clone() {
        match signaller.terminate_group(pid) {
            Ok(outcome) => {
                if outcome == SignalOutcome::NoSuchProcess {
                    reporter.success(&format!("{vid} (pid {pid}) had already exited"));
                } else {
                    reporter.success(&format!("stopped {vid} (pid {pid})"));
                }
                pids.remove(&vid);
                report.stopped.push(ObuEntry { vehicle_id: vid, pid });
            }
            Err(e) => {
                reporter.warn(&format!("{vid} (pid {pid}): {e:#}"));
                report.failed.push(ObuFailure {
                    vehicle_id: vid,
                    error: format!("{e:#}"),
                });
            }
        }
    }
    store.save_obus(&pids).await?;
    Ok(report)
}

/// Every tracked runner with liveness.
///
/// # Errors
///
/// Returns an error when the pid map cannot be loaded.
pub async fn list_obus(
    signaller: &impl ProcessSignaller,
    store: &impl ObuStore,
) -> Result<Vec<ObuStatus>> {
    Ok(store
        .load_obus()
        .await?
        .into_iter()
        .map(|(vehicle_id, pid)| ObuStatus {
            alive: signaller.is_alive(pid),
            vehicle_id,
            pid,
        })
        .collect())
}
