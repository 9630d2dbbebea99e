//! Application service: launching a single edge-server worker.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::PathBuf;

use crate::application::ports::{
    LaunchRequest, Launched, LocalFs, PortProbe, ProcessSpawner, ProcessSpec, WorkerLauncher,
};
use crate::domain::config::WorkerConfig;
use crate::domain::env::{EnvMap, layer_environment, parse_env_file};
use crate::domain::{LaunchError, PortAvailability};

/// Log file of a worker: `<logs_dir>/rsu_<id>_<port>.log`.
#[must_use]
pub fn worker_log_path(logs_dir: &std::path::Path, id: &str, port: u16) -> PathBuf {
    logs_dir.join(format!("rsu_{id}_{port}.log"))
}

/// Production [`WorkerLauncher`] composed from lower-level ports.
pub struct EdgeWorkerLauncher<S, P, F> {
    spawner: S,
    probe: P,
    fs: F,
    worker: WorkerConfig,
    logs_dir: PathBuf,
    inherited: EnvMap,
}

impl<S, P, F> EdgeWorkerLauncher<S, P, F>
where
    S: ProcessSpawner,
    P: PortProbe,
    F: LocalFs,
{
    /// `inherited` is the environment every worker starts from.
    pub fn new(
        spawner: S,
        probe: P,
        fs: F,
        worker: WorkerConfig,
        logs_dir: PathBuf,
        inherited: EnvMap,
    ) -> Self {
        Self {
            spawner,
            probe,
            fs,
            worker,
            logs_dir,
            inherited,
        }
    }

    /// Contents of the worker defaults file; unreadable files are skipped.
    fn defaults(&self) -> EnvMap {
        let path = self.worker.env_file_path();
        match self.fs.read_optional(&path) {
            Ok(Some(content)) => parse_env_file(&content),
            Ok(None) => EnvMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable defaults file");
                EnvMap::new()
            }
        }
    }

    /// Build the spawn spec for `request` without starting anything.
    #[must_use]
    pub fn spec_for(&self, request: &LaunchRequest) -> ProcessSpec {
        let mut overrides = request.overrides.clone();
        overrides.insert("PORT".to_string(), request.port.to_string());
        ProcessSpec {
            program: self.worker.program.clone(),
            args: self.worker.args.clone(),
            cwd: self.worker.dir.clone(),
            env: layer_environment(self.inherited.clone(), &overrides, &self.defaults()),
            log_file: worker_log_path(&self.logs_dir, &request.id, request.port),
            startup_grace: self.worker.startup_grace(),
        }
    }
}

impl<S, P, F> WorkerLauncher for EdgeWorkerLauncher<S, P, F>
where
    S: ProcessSpawner,
    P: PortProbe,
    F: LocalFs,
{
    async fn launch(&self, request: &LaunchRequest) -> Result<Launched, LaunchError> {
        // The allocator's earlier check does not reserve the port.
        match self.probe.check(request.port).await {
            Ok(PortAvailability::Available) => {}
            Ok(PortAvailability::InUse) => {
                return Err(LaunchError::PortInUse { port: request.port });
            }
            Err(e) => return Err(LaunchError::Spawn(format!("port check failed: {e}"))),
        }

        let spec = self.spec_for(request);
        tracing::info!(
            instance = %request.id,
            port = request.port,
            program = %spec.program,
            log = %spec.log_file.display(),
            "launching worker"
        );
        let pid = self.spawner.spawn_detached(&spec).await.inspect_err(|e| {
            tracing::warn!(instance = %request.id, port = request.port, error = %e, "launch failed");
        })?;
        tracing::info!(instance = %request.id, port = request.port, pid, "worker started");
        Ok(Launched {
            pid,
            log_file: spec.log_file,
        })
    }
}
