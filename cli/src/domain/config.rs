//! Fleet configuration schema.
//!
//! Pure types only. Loading and environment overrides live in
//! `infra::config`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `<state-dir>/config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FleetConfig {
    pub worker: WorkerConfig,
    pub registrar: RegistrarConfig,
    pub health: HealthConfig,
    pub deploy: DeployConfig,
}

/// How edge-server workers are started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Working directory of every worker.
    pub dir: PathBuf,
    pub program: String,
    pub args: Vec<String>,
    /// Defaults file, relative to `dir` unless absolute.
    pub env_file: PathBuf,
    /// Dependency install command; empty disables the install step.
    pub install: Vec<String>,
    /// Directory under `dir` whose presence means dependencies are installed.
    pub dependencies_marker: String,
    /// Time a fresh worker must survive before it counts as launched.
    pub startup_grace_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("edge_server"),
            program: "npm".to_string(),
            args: vec!["start".to_string()],
            env_file: PathBuf::from(".env"),
            install: vec!["npm".to_string(), "install".to_string()],
            dependencies_marker: "node_modules".to_string(),
            startup_grace_ms: 500,
        }
    }
}

impl WorkerConfig {
    #[must_use]
    pub fn env_file_path(&self) -> PathBuf {
        resolve_under(&self.dir, &self.env_file)
    }

    #[must_use]
    pub fn startup_grace(&self) -> Duration {
        Duration::from_millis(self.startup_grace_ms)
    }
}

/// External registrar invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrarConfig {
    pub program: String,
    /// Script path, relative to the worker dir unless absolute.
    pub script: PathBuf,
    pub timeout_secs: u64,
    /// Funding handed to `--fund-amount`; `None` omits the flag.
    pub fund_amount: Option<String>,
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            program: "node".to_string(),
            script: PathBuf::from("scripts/register_edge_server.js"),
            timeout_secs: 120,
            fund_amount: Some("0.05".to_string()),
        }
    }
}

impl RegistrarConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub timeout_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self { timeout_ms: 2000 }
    }
}

impl HealthConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Concurrent launches per deploy.
    pub parallelism: usize,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self { parallelism: 4 }
    }
}

/// Join `path` onto `base` unless it is already absolute.
#[must_use]
pub fn resolve_under(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
