//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::env::EnvMap;
use crate::domain::obu::ObuPidMap;
use crate::domain::{
    DeploymentManifest, FleetConfig, HttpProbeResponse, Instance, LaunchError, PortAvailability,
    RegistrationResult, SecretKey,
};

// ── Value Types ───────────────────────────────────────────────────────────────

/// A fully described external command.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Variables added on top of the inherited environment.
    pub env: Vec<(String, String)>,
}

impl Invocation {
    /// `program args...` in the manager's working directory.
    #[must_use]
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Everything needed to start one detached worker process.
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Complete child environment; nothing else is inherited.
    pub env: EnvMap,
    /// stdout and stderr are appended here.
    pub log_file: PathBuf,
    /// A child that exits within this window counts as a failed launch.
    pub startup_grace: Duration,
}

/// Result of signalling a process group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    /// The OS accepted the termination signal.
    Delivered,
    /// No such process or group exists any more.
    NoSuchProcess,
}

/// One worker launch request.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub id: String,
    pub port: u16,
    /// Instance-specific variables; they win over inherited ones.
    pub overrides: EnvMap,
}

/// A worker that survived its startup grace period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launched {
    pub pid: u32,
    pub log_file: PathBuf,
}

/// Input of one registrar call.
#[derive(Debug, Clone)]
pub struct RegistrarCall {
    pub instance_id: String,
    pub port: u16,
    pub private_key: SecretKey,
    pub admin_key: Option<SecretKey>,
    pub fund_amount: Option<String>,
}

impl RegistrarCall {
    /// Identity the registrar binds on the network.
    #[must_use]
    pub fn server_id(&self) -> String {
        format!("RSU-{}", self.instance_id)
    }

    #[must_use]
    pub fn location(&self) -> String {
        format!("port:{}", self.port)
    }
}

/// What the external registrar answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrarReply {
    pub exit_ok: bool,
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run `invocation` to completion and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run(&self, invocation: &Invocation, timeout: Duration) -> Result<Output>;
}

// ── Process Ports ─────────────────────────────────────────────────────────────

/// Starts long-running processes detached from the manager.
#[allow(async_fn_in_trait)]
pub trait ProcessSpawner {
    /// Spawn `spec` in its own process group and return its pid.
    ///
    /// Dropping the future before it resolves must not leave the child
    /// running.
    ///
    /// # Errors
    ///
    /// Returns a [`LaunchError`] when the executable is missing, the log
    /// sink cannot be opened, the spawn fails, or the child exits during
    /// the startup grace period.
    async fn spawn_detached(&self, spec: &ProcessSpec) -> Result<u32, LaunchError>;
}

/// OS-level liveness probe and group termination.
pub trait ProcessSignaller {
    /// Null-signal probe. Never fails; an unknown pid is simply not alive.
    fn is_alive(&self, pid: u32) -> bool;
    /// Send SIGTERM to the process group led by `pid`.
    ///
    /// # Errors
    ///
    /// Returns an error when the OS rejects the signal for a reason other
    /// than the target being gone.
    fn terminate_group(&self, pid: u32) -> Result<SignalOutcome>;
}

/// Loopback bindability check.
#[allow(async_fn_in_trait)]
pub trait PortProbe {
    /// Check whether `port` can currently be bound on loopback.
    async fn check(&self, port: u16) -> Result<PortAvailability>;
}

/// Starts one edge-server worker.
#[allow(async_fn_in_trait)]
pub trait WorkerLauncher {
    /// Launch one worker with layered environment and an append-mode log.
    ///
    /// # Errors
    ///
    /// Returns the [`LaunchError`] that kept this single instance from
    /// starting.
    async fn launch(&self, request: &LaunchRequest) -> Result<Launched, LaunchError>;
}

// ── HTTP Ports ────────────────────────────────────────────────────────────────

/// Abstracts the `/health` GET so health checks can run against fixtures.
#[allow(async_fn_in_trait)]
pub trait HealthProbe {
    /// GET `<base_url>/health` within `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error for connection failures and timeouts; any HTTP
    /// status is a successful exchange.
    async fn get_health(&self, base_url: &str, timeout: Duration) -> Result<HttpProbeResponse>;
}

/// Fetches the `/api/stats` document of one worker.
#[allow(async_fn_in_trait)]
pub trait StatsClient {
    async fn fetch_stats(&self, base_url: &str) -> Result<serde_json::Value>;
}

// ── Registrar Port ────────────────────────────────────────────────────────────

/// The external registrar, reduced to one opaque call.
#[allow(async_fn_in_trait)]
pub trait Registrar {
    /// Invoke the registrar once for `call`.
    ///
    /// # Errors
    ///
    /// Returns an error if the registrar could not be run at all or timed out.
    async fn submit(&self, call: &RegistrarCall) -> Result<RegistrarReply>;
}

/// Registration stage as seen by the fleet controller.
#[allow(async_fn_in_trait)]
pub trait RegistrationStage {
    /// Register one instance. Failures are data, never errors.
    async fn register(&self, call: &RegistrarCall) -> RegistrationResult;
}

// ── Persistence Ports ─────────────────────────────────────────────────────────

/// Durable id → instance mapping, one record per instance.
#[allow(async_fn_in_trait)]
pub trait ProcessRegistry {
    /// Persist one instance's launch facts, replacing any record with the same id.
    async fn record(&self, instance: &Instance) -> Result<()>;
    async fn lookup(&self, id: &str) -> Result<Option<Instance>>;
    /// Every readable record in launch order. Unreadable records are skipped.
    async fn list_all(&self) -> Result<Vec<Instance>>;
    /// Delete the record for `id`; a missing record is not an error.
    async fn remove(&self, id: &str) -> Result<()>;
}

/// Load/save of the aggregate deployment manifest.
#[allow(async_fn_in_trait)]
pub trait ManifestStore {
    async fn load_manifest(&self) -> Result<Option<DeploymentManifest>>;
    /// Replace the manifest atomically.
    async fn save_manifest(&self, manifest: &DeploymentManifest) -> Result<()>;
}

/// Load/save of the simulated-client pid map.
#[allow(async_fn_in_trait)]
pub trait ObuStore {
    async fn load_obus(&self) -> Result<ObuPidMap>;
    async fn save_obus(&self, pids: &ObuPidMap) -> Result<()>;
}

/// Configuration file access.
pub trait ConfigStore {
    /// Load configuration, or defaults when no file exists.
    fn load(&self) -> Result<FleetConfig>;
    /// Path the configuration is read from.
    fn path(&self) -> PathBuf;
}

/// Raw local filesystem operations used by services.
pub trait LocalFs {
    fn exists(&self, path: &Path) -> bool;
    /// Read a UTF-8 file, `None` when it does not exist.
    fn read_optional(&self, path: &Path) -> Result<Option<String>>;
    /// Regular files directly inside `dir`, sorted; empty when `dir` is missing.
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    /// Move `from` to `to`, creating `to`'s parent first.
    fn move_file(&self, from: &Path, to: &Path) -> Result<()>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
