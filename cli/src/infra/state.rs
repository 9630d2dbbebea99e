//! Infrastructure implementation of the persistence ports.
//!
//! `FileRegistry` keeps one JSON record per instance under `pids/`, the
//! deployment manifest, and the simulated-client pid map. Every write goes
//! through [`write_atomic`] so readers never observe a half-written file.
//! Blocking filesystem work runs on `tokio::task::spawn_blocking`.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::application::ports::{ManifestStore, ObuStore, ProcessRegistry};
use crate::domain::instance::sort_by_launch;
use crate::domain::obu::ObuPidMap;
use crate::domain::{DeploymentManifest, FleetError, Instance, validate_instance_id};

/// Default state directory name under the home directory.
pub const STATE_DIR_NAME: &str = ".rsu-fleet";

// ── Layout ────────────────────────────────────────────────────────────────────

/// Paths inside the state directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLayout {
    root: PathBuf,
}

impl StateLayout {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Use `explicit` when given, otherwise `~/.rsu-fleet`.
    ///
    /// # Errors
    ///
    /// Returns an error if no override is given and the home directory
    /// cannot be determined.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        if let Some(root) = explicit {
            return Ok(Self::new(root));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(Self::new(home.join(STATE_DIR_NAME)))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.yaml")
    }

    #[must_use]
    pub fn manifest(&self) -> PathBuf {
        self.root.join("deployment.json")
    }

    #[must_use]
    pub fn pids_dir(&self) -> PathBuf {
        self.root.join("pids")
    }

    #[must_use]
    pub fn pid_record(&self, id: &str) -> PathBuf {
        self.pids_dir().join(format!("rsu_{id}.json"))
    }

    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    #[must_use]
    pub fn obu_pids(&self) -> PathBuf {
        self.root.join("obu_pids.json")
    }

    #[must_use]
    pub fn archive_dir(&self) -> PathBuf {
        self.root.join("archive")
    }
}

// ── Atomic writes ─────────────────────────────────────────────────────────────

fn persistence(action: &'static str, path: &Path, err: impl std::fmt::Display) -> FleetError {
    FleetError::Persistence {
        action,
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

/// Replace `path` with `content` via a temp file in the same directory.
///
/// The file is created with mode 0600 on unix.
///
/// # Errors
///
/// Returns [`FleetError::Persistence`] if any step fails; the previous
/// content is left untouched in that case.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), FleetError> {
    let dir = path
        .parent()
        .ok_or_else(|| persistence("write", path, "path has no parent directory"))?;
    std::fs::create_dir_all(dir).map_err(|e| persistence("create", dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| persistence("write", path, e))?;
    tmp.write_all(content)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| persistence("write", path, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o600))
            .map_err(|e| persistence("set permissions on", tmp.path(), e))?;
    }

    tmp.persist(path).map_err(|e| persistence("write", path, e.error))?;
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), FleetError> {
    let content = serde_json::to_vec_pretty(value).map_err(|e| persistence("serialize", path, e))?;
    write_atomic(path, &content)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, FleetError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(persistence("read", path, e)),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| persistence("parse", path, e))
}

fn remove_if_exists(path: &Path) -> Result<(), FleetError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(persistence("remove", path, e)),
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// File-backed registry, manifest and simulated-client store.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    layout: StateLayout,
}

impl FileRegistry {
    #[must_use]
    pub fn new(layout: StateLayout) -> Self {
        Self { layout }
    }

    #[must_use]
    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    fn record_sync(&self, instance: &Instance) -> Result<()> {
        validate_instance_id(&instance.id)?;
        let path = self.layout.pid_record(&instance.id);
        write_json(&path, instance)?;
        tracing::debug!(instance = %instance.id, path = %path.display(), "instance record written");
        Ok(())
    }

    fn lookup_sync(&self, id: &str) -> Result<Option<Instance>> {
        if validate_instance_id(id).is_err() {
            return Ok(None);
        }
        Ok(read_json(&self.layout.pid_record(id))?)
    }

    fn list_sync(&self) -> Result<Vec<Instance>> {
        let dir = self.layout.pids_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(persistence("list", &dir, e).into()),
        };
        let mut instances = Vec::new();
        for entry in entries {
            let path = entry.with_context(|| format!("listing {}", dir.display()))?.path();
            let is_record = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("rsu_") && n.ends_with(".json"));
            if !is_record {
                continue;
            }
            match read_json::<Instance>(&path) {
                Ok(Some(instance)) => instances.push(instance),
                Ok(None) => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable instance record"),
            }
        }
        sort_by_launch(&mut instances);
        Ok(instances)
    }

    fn remove_sync(&self, id: &str) -> Result<()> {
        validate_instance_id(id)?;
        remove_if_exists(&self.layout.pid_record(id))?;
        tracing::debug!(instance = %id, "instance record removed");
        Ok(())
    }

    async fn blocking<T, F>(&self, what: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(FileRegistry) -> Result<T> + Send + 'static,
    {
        let registry = self.clone();
        tokio::task::spawn_blocking(move || f(registry))
            .await
            .with_context(|| format!("{what} task panicked"))?
    }
}

impl ProcessRegistry for FileRegistry {
    async fn record(&self, instance: &Instance) -> Result<()> {
        let instance = instance.clone();
        self.blocking("registry record", move |r| r.record_sync(&instance)).await
    }

    async fn lookup(&self, id: &str) -> Result<Option<Instance>> {
        let id = id.to_string();
        self.blocking("registry lookup", move |r| r.lookup_sync(&id)).await
    }

    async fn list_all(&self) -> Result<Vec<Instance>> {
        self.blocking("registry list", |r| r.list_sync()).await
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.blocking("registry remove", move |r| r.remove_sync(&id)).await
    }
}

impl ManifestStore for FileRegistry {
    async fn load_manifest(&self) -> Result<Option<DeploymentManifest>> {
        self.blocking("manifest load", |r| Ok(read_json(&r.layout.manifest())?))
            .await
    }

    async fn save_manifest(&self, manifest: &DeploymentManifest) -> Result<()> {
        let manifest = manifest.clone();
        self.blocking("manifest save", move |r| {
            Ok(write_json(&r.layout.manifest(), &manifest)?)
        })
        .await
    }
}

impl ObuStore for FileRegistry {
    async fn load_obus(&self) -> Result<ObuPidMap> {
        self.blocking("obu load", |r| {
            Ok(read_json(&r.layout.obu_pids())?.unwrap_or_default())
        })
        .await
    }

    async fn save_obus(&self, pids: &ObuPidMap) -> Result<()> {
        let pids = pids.clone();
        self.blocking("obu save", move |r| Ok(write_json(&r.layout.obu_pids(), &pids)?))
            .await
    }
}
