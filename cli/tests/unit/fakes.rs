//! In-memory port implementations shared by the service tests.
//!
//! Each fake records what the service asked of it so tests can assert on
//! the calls as well as on the returned reports.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use anyhow::Result;
use rsu_fleet_cli::application::ports::{
    LaunchRequest, Launched, ManifestStore, ObuStore, PortProbe, ProcessRegistry,
    ProcessSignaller, ProcessSpawner, ProcessSpec, ProgressReporter, RegistrarCall,
    RegistrationStage, SignalOutcome, WorkerLauncher,
};
use rsu_fleet_cli::domain::instance::id_sort_key;
use rsu_fleet_cli::domain::obu::ObuPidMap;
use rsu_fleet_cli::domain::{
    DeploymentManifest, Instance, LaunchError, PortAvailability, RegistrationResult,
};

// ── Registry / manifest / OBU store ──────────────────────────────────────────

/// Registry, manifest store and OBU store backed by maps.
#[derive(Default)]
pub struct MemoryStore {
    pub records: Mutex<BTreeMap<String, Instance>>,
    pub manifest: Mutex<Option<DeploymentManifest>>,
    pub manifest_writes: AtomicUsize,
    pub obus: Mutex<ObuPidMap>,
    /// `record` fails for these ids.
    pub reject_records: HashSet<String>,
}

impl MemoryStore {
    pub fn with_instances(instances: impl IntoIterator<Item = Instance>) -> Self {
        let store = Self::default();
        {
            let mut records = store.records.lock().unwrap();
            for inst in instances {
                records.insert(inst.id.clone(), inst);
            }
        }
        store
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.records.lock().unwrap().keys().cloned().collect();
        ids.sort_by_key(|id| id_sort_key(id));
        ids
    }

    pub fn manifest(&self) -> Option<DeploymentManifest> {
        self.manifest.lock().unwrap().clone()
    }

    pub fn manifest_ids(&self) -> Vec<String> {
        self.manifest()
            .map(|m| m.instances.into_iter().map(|i| i.id).collect())
            .unwrap_or_default()
    }
}

impl ProcessRegistry for MemoryStore {
    async fn record(&self, instance: &Instance) -> Result<()> {
        if self.reject_records.contains(&instance.id) {
            anyhow::bail!("disk full");
        }
        self.records
            .lock()
            .unwrap()
            .insert(instance.id.clone(), instance.clone());
        Ok(())
    }

    async fn lookup(&self, id: &str) -> Result<Option<Instance>> {
        Ok(self.records.lock().unwrap().get(id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Instance>> {
        let mut all: Vec<Instance> = self.records.lock().unwrap().values().cloned().collect();
        all.sort_by_key(|i| id_sort_key(&i.id));
        Ok(all)
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.records.lock().unwrap().remove(id);
        Ok(())
    }
}

impl ManifestStore for MemoryStore {
    async fn load_manifest(&self) -> Result<Option<DeploymentManifest>> {
        Ok(self.manifest())
    }

    async fn save_manifest(&self, manifest: &DeploymentManifest) -> Result<()> {
        self.manifest_writes.fetch_add(1, Ordering::SeqCst);
        *self.manifest.lock().unwrap() = Some(manifest.clone());
        Ok(())
    }
}

impl ObuStore for MemoryStore {
    async fn load_obus(&self) -> Result<ObuPidMap> {
        Ok(self.obus.lock().unwrap().clone())
    }

    async fn save_obus(&self, pids: &ObuPidMap) -> Result<()> {
        *self.obus.lock().unwrap() = pids.clone();
        Ok(())
    }
}

// ── Ports ────────────────────────────────────────────────────────────────────

/// Every port is free except the listed ones.
#[derive(Default)]
pub struct BusyPorts(pub HashSet<u16>);

impl BusyPorts {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn of(ports: &[u16]) -> Self {
        Self(ports.iter().copied().collect())
    }
}

impl PortProbe for BusyPorts {
    async fn check(&self, port: u16) -> Result<PortAvailability> {
        Ok(if self.0.contains(&port) {
            PortAvailability::InUse
        } else {
            PortAvailability::Available
        })
    }
}

// ── Launcher ─────────────────────────────────────────────────────────────────

/// Hands out sequential pids; fails the launch of the listed ids.
pub struct FakeLauncher {
    next_pid: AtomicU32,
    pub fail_ids: HashSet<String>,
    pub requests: Mutex<Vec<LaunchRequest>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self {
            next_pid: AtomicU32::new(1000),
            fail_ids: HashSet::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(ids: &[&str]) -> Self {
        Self {
            fail_ids: ids.iter().map(ToString::to_string).collect(),
            ..Self::new()
        }
    }

    pub fn launched_ports(&self) -> Vec<u16> {
        let mut ports: Vec<u16> = self.requests.lock().unwrap().iter().map(|r| r.port).collect();
        ports.sort_unstable();
        ports
    }

    pub fn request_for(&self, id: &str) -> Option<LaunchRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }
}

impl WorkerLauncher for FakeLauncher {
    async fn launch(&self, request: &LaunchRequest) -> Result<Launched, LaunchError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_ids.contains(&request.id) {
            return Err(LaunchError::ExitedEarly {
                status: "exit status: 1".to_string(),
                log_file: PathBuf::from(format!("logs/rsu_{}_{}.log", request.id, request.port)),
            });
        }
        Ok(Launched {
            pid: self.next_pid.fetch_add(1, Ordering::SeqCst),
            log_file: PathBuf::from(format!("logs/rsu_{}_{}.log", request.id, request.port)),
        })
    }
}

// ── Registration ─────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum RegistrarMode {
    Succeed,
    Fail,
    /// Never answers.
    Hang,
}

pub struct FakeRegistration {
    pub mode: RegistrarMode,
    pub calls: Mutex<Vec<String>>,
}

impl FakeRegistration {
    pub fn new(mode: RegistrarMode) -> Self {
        Self {
            mode,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn called_ids(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl RegistrationStage for FakeRegistration {
    async fn register(&self, call: &RegistrarCall) -> RegistrationResult {
        self.calls.lock().unwrap().push(call.instance_id.clone());
        match self.mode {
            RegistrarMode::Succeed => {
                RegistrationResult::succeeded(&call.instance_id, Some(format!("0xtx{}", call.port)))
            }
            RegistrarMode::Fail => {
                RegistrationResult::failed(&call.instance_id, "chain unreachable")
            }
            RegistrarMode::Hang => std::future::pending().await,
        }
    }
}

// ── Signaller ────────────────────────────────────────────────────────────────

/// Scripted liveness and signal delivery.
#[derive(Default)]
pub struct FakeSignaller {
    pub alive: Mutex<HashSet<u32>>,
    /// Pids the OS reports as gone when signalled.
    pub gone: HashSet<u32>,
    /// Pids for which the OS rejects the signal.
    pub rejected: HashSet<u32>,
    pub terminated: Mutex<Vec<u32>>,
}

impl FakeSignaller {
    pub fn alive(pids: &[u32]) -> Self {
        Self {
            alive: Mutex::new(pids.iter().copied().collect()),
            ..Self::default()
        }
    }

    pub fn terminated(&self) -> Vec<u32> {
        self.terminated.lock().unwrap().clone()
    }
}

impl ProcessSignaller for FakeSignaller {
    fn is_alive(&self, pid: u32) -> bool {
        self.alive.lock().unwrap().contains(&pid)
    }

    fn terminate_group(&self, pid: u32) -> Result<SignalOutcome> {
        if self.rejected.contains(&pid) {
            anyhow::bail!("Operation not permitted");
        }
        self.terminated.lock().unwrap().push(pid);
        self.alive.lock().unwrap().remove(&pid);
        Ok(if self.gone.contains(&pid) {
            SignalOutcome::NoSuchProcess
        } else {
            SignalOutcome::Delivered
        })
    }
}

// ── Spawner ──────────────────────────────────────────────────────────────────

/// Records spawn specs; fails for programs whose args mention a listed word.
pub struct FakeSpawner {
    next_pid: AtomicU32,
    pub fail_when_arg: Option<String>,
    pub specs: Mutex<Vec<ProcessSpec>>,
}

impl FakeSpawner {
    pub fn new() -> Self {
        Self {
            next_pid: AtomicU32::new(5000),
            fail_when_arg: None,
            specs: Mutex::new(Vec::new()),
        }
    }

    /// Fails every spawn whose arguments contain `word`.
    pub fn failing_on(word: &str) -> Self {
        Self {
            fail_when_arg: Some(word.to_string()),
            ..Self::new()
        }
    }
}

impl ProcessSpawner for FakeSpawner {
    async fn spawn_detached(&self, spec: &ProcessSpec) -> Result<u32, LaunchError> {
        self.specs.lock().unwrap().push(spec.clone());
        if let Some(word) = &self.fail_when_arg
            && spec.args.iter().any(|a| a == word)
        {
            return Err(LaunchError::ExitedEarly {
                status: "exit status: 2".to_string(),
                log_file: spec.log_file.clone(),
            });
        }
        Ok(self.next_pid.fetch_add(1, Ordering::SeqCst))
    }
}

// ── Reporter ─────────────────────────────────────────────────────────────────

/// Collects progress lines prefixed with their kind.
#[derive(Default)]
pub struct RecordingReporter(pub Mutex<Vec<String>>);

impl RecordingReporter {
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|l| l.strip_prefix("warn: ").map(str::to_string))
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.0.lock().unwrap().push(format!("step: {message}"));
    }

    fn success(&self, message: &str) {
        self.0.lock().unwrap().push(format!("ok: {message}"));
    }

    fn warn(&self, message: &str) {
        self.0.lock().unwrap().push(format!("warn: {message}"));
    }
}
