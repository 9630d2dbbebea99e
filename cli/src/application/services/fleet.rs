//! Application service: fleet orchestration.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Launches run concurrently with bounded parallelism; registration then
//! runs once per launched instance, in id order. Per-instance failures are
//! captured on that instance's outcome and never abort the batch.

use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use anyhow::Result;
use futures_util::StreamExt as _;
use futures_util::stream;
use serde::Serialize;

use crate::application::ports::{
    LaunchRequest, ManifestStore, PortProbe, ProcessRegistry, ProcessSignaller, ProgressReporter,
    RegistrarCall, RegistrationStage, SignalOutcome, WorkerLauncher,
};
use crate::application::services::port_allocator::PortAllocator;
use crate::domain::env::EnvMap;
use crate::domain::instance::{id_sort_key, validate_instance_id};
use crate::domain::{
    DeployReport, DeployRequest, DeploymentManifest, FleetError, Instance, InstanceOutcome,
    InstanceSnapshot, InstanceStage, InstanceStatus, PortAvailability, SecretKey, SkipReason,
};

// ── Inputs and reports ────────────────────────────────────────────────────────

/// Controller-wide settings.
#[derive(Debug, Clone)]
pub struct FleetOptions {
    /// Concurrent launches during deploy; values below 1 mean 1.
    pub parallelism: usize,
    /// Exported to every worker as `LOG_DIR`.
    pub logs_dir: PathBuf,
}

/// Deploy-time inputs beyond the port range.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub request: DeployRequest,
    pub admin_key: Option<SecretKey>,
    pub fund_amount: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopOutcome {
    /// SIGTERM was accepted by the OS; shutdown is asynchronous.
    Terminated,
    /// The process group was already gone.
    AlreadyExited,
}

#[derive(Debug, Clone, Serialize)]
pub struct StopReport {
    pub id: String,
    pub pid: u32,
    pub port: u16,
    pub outcome: StopOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct StopFailure {
    pub id: String,
    pub pid: u32,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StopAllReport {
    pub stopped: Vec<StopReport>,
    pub failed: Vec<StopFailure>,
    /// Generation of the rewritten manifest, if one was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
}

// ── Launch bookkeeping ────────────────────────────────────────────────────────

/// Processes launched by the current run, for cleanup on cancellation.
#[derive(Default)]
struct LaunchLedger(Mutex<Vec<(String, u32)>>);

impl LaunchLedger {
    fn push(&self, id: &str, pid: u32) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id.to_string(), pid));
    }

    fn forget(&self, pid: u32) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(_, p)| *p != pid);
    }

    fn take(&self) -> Vec<(String, u32)> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

enum LaunchStep {
    Skipped(InstanceOutcome),
    Launched {
        instance: Instance,
        key: SecretKey,
        stage: InstanceStage,
    },
}

// ── Controller ────────────────────────────────────────────────────────────────

/// Orchestrates port allocation, launch, registration, and persistence.
///
/// Every collaborator is an injected port; the controller owns no global
/// state and is the sole writer of the registry and manifest for the
/// lifetime of one command.
pub struct FleetController<'a, G, M, L, P, R, S> {
    pub registry: &'a G,
    pub manifests: &'a M,
    pub launcher: &'a L,
    pub ports: &'a P,
    pub registration: &'a R,
    pub signaller: &'a S,
    pub options: FleetOptions,
}

impl<G, M, L, P, R, S> FleetController<'_, G, M, L, P, R, S>
where
    G: ProcessRegistry,
    M: ManifestStore,
    L: WorkerLauncher,
    P: PortProbe,
    R: RegistrationStage,
    S: ProcessSignaller,
{
    /// Deploy `count` instances from `start_port`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid request or a persistence failure.
    /// Port, launch and registration failures are reported per instance.
    pub async fn deploy(
        &self,
        opts: &DeployOptions,
        reporter: &impl ProgressReporter,
    ) -> Result<DeployReport> {
        self.deploy_until(opts, reporter, std::future::pending()).await
    }

    /// Deploy, aborting when `cancel` completes.
    ///
    /// On cancellation every process launched by this run receives SIGTERM
    /// before [`FleetError::Cancelled`] is returned.
    ///
    /// # Errors
    ///
    /// Same as [`Self::deploy`], plus [`FleetError::Cancelled`].
    pub async fn deploy_until(
        &self,
        opts: &DeployOptions,
        reporter: &impl ProgressReporter,
        cancel: impl Future<Output = ()>,
    ) -> Result<DeployReport> {
        opts.request.validate()?;
        let ledger = LaunchLedger::default();
        let finished = tokio::select! {
            report = self.run_deploy(opts, reporter, &ledger) => Some(report),
            () = cancel => None,
        };
        if let Some(report) = finished {
            return report;
        }
        reporter.warn("deployment interrupted, terminating launched instances");
        let terminated = self.terminate_launched(&ledger, reporter).await;
        Err(FleetError::Cancelled { terminated }.into())
    }

    async fn run_deploy(
        &self,
        opts: &DeployOptions,
        reporter: &impl ProgressReporter,
        ledger: &LaunchLedger,
    ) -> Result<DeployReport> {
        let DeployRequest { count, start_port } = opts.request;
        let existing = self.registry.list_all().await?;
        let taken_ids: HashSet<String> = existing.iter().map(|i| i.id.clone()).collect();
        let allocator = PortAllocator::new(self.ports, &existing);
        let candidates = PortAllocator::<P>::candidates(start_port, count)?;

        reporter.step(&format!(
            "launching {count} instance(s) on ports {start_port}-{}",
            candidates.last().copied().unwrap_or(start_port)
        ));
        let (allocator, taken_ids) = (&allocator, &taken_ids);
        let steps: Vec<LaunchStep> = stream::iter(candidates.into_iter().enumerate())
            .map(|(index, port)| {
                let id = DeployRequest::instance_id(index);
                self.launch_one(id, port, allocator, taken_ids, ledger, reporter)
            })
            .buffer_unordered(self.options.parallelism.max(1))
            .collect()
            .await;

        let mut outcomes = Vec::with_capacity(steps.len());
        let mut launched = Vec::new();
        for step in steps {
            match step {
                LaunchStep::Skipped(outcome) => outcomes.push(outcome),
                LaunchStep::Launched { instance, key, stage } => launched.push((instance, key, stage)),
            }
        }
        launched.sort_by_key(|(inst, _, _)| id_sort_key(&inst.id));

        let mut recorded = Vec::with_capacity(launched.len());
        for (mut instance, key, stage) in launched {
            let call = RegistrarCall {
                instance_id: instance.id.clone(),
                port: instance.port,
                private_key: key,
                admin_key: opts.admin_key.clone(),
                fund_amount: opts.fund_amount.clone(),
            };
            reporter.step(&format!("registering instance {}", instance.id));
            let result = self.registration.register(&call).await;
            match (result.failure(), &result.tx_id) {
                (Some(err), _) => {
                    tracing::warn!(instance = %instance.id, code = err.code(), "{err}");
                    reporter.warn(&err.to_string());
                }
                (None, Some(tx)) => {
                    reporter.success(&format!("instance {} registered (tx {tx})", instance.id));
                }
                (None, None) => reporter.success(&format!("instance {} registered", instance.id)),
            }

            let stage = stage.advance(InstanceStage::Registered);
            instance.registration = Some(result.outcome());
            if let Err(e) = self.registry.record(&instance).await {
                // The launch-time record still tracks the process.
                tracing::warn!(instance = %instance.id, error = %e, "cannot store registration outcome");
                reporter.warn(&format!("instance {}: {e:#}", instance.id));
            }
            outcomes.push(InstanceOutcome::recorded(
                instance.id.clone(),
                instance.port,
                instance.pid,
                stage,
                result,
            ));
            recorded.push(instance);
        }

        if recorded.is_empty() {
            reporter.warn("no instance was deployed; manifest left unchanged");
            return Ok(DeployReport::new(outcomes, None));
        }

        let previous = self.load_previous_manifest().await;
        let manifest = DeploymentManifest::succeed(
            previous.as_ref(),
            recorded.iter().map(InstanceSnapshot::from).collect(),
        );
        self.manifests.save_manifest(&manifest).await?;
        tracing::info!(
            generation = manifest.generation,
            instances = manifest.instances.len(),
            "manifest written"
        );
        Ok(DeployReport::new(outcomes, Some(manifest.generation)))
    }

    /// Drive one instance from `Requested` to `Launched` or `Skipped`.
    async fn launch_one(
        &self,
        id: String,
        port: u16,
        allocator: &PortAllocator<'_, P>,
        taken_ids: &HashSet<String>,
        ledger: &LaunchLedger,
        reporter: &impl ProgressReporter,
    ) -> LaunchStep {
        let skip = |reached: InstanceStage, reason: SkipReason, err: &dyn std::fmt::Display| {
            reporter.warn(&format!("instance {id}: {err}, skipping"));
            LaunchStep::Skipped(InstanceOutcome::skipped(id.clone(), port, reached, reason, err))
        };
        let stage = InstanceStage::Requested;

        if taken_ids.contains(&id) {
            let err = FleetError::InvalidRequest(format!(
                "id {id} is already managed; stop it before redeploying"
            ));
            return skip(stage, SkipReason::IdInUse, &err);
        }
        match allocator.allocate(port).await {
            Ok(PortAvailability::Available) => {}
            Ok(PortAvailability::InUse) => {
                let err = FleetError::PortUnavailable { port };
                return skip(stage, SkipReason::PortUnavailable, &err);
            }
            Err(e) => {
                return skip(stage, SkipReason::PortUnavailable, &format!("port {port}: {e:#}"));
            }
        }
        let stage = stage.advance(InstanceStage::PortChecked);

        let key = SecretKey::generate();
        let request = LaunchRequest {
            id: id.clone(),
            port,
            overrides: self.instance_env(&id, &key),
        };
        let launched = match self.launcher.launch(&request).await {
            Ok(launched) => launched,
            Err(e) => {
                let err = e.into_fleet_error(&id);
                let reason = match err {
                    FleetError::PortUnavailable { .. } => SkipReason::PortUnavailable,
                    _ => SkipReason::LaunchFailed,
                };
                return skip(stage, reason, &err);
            }
        };
        ledger.push(&id, launched.pid);
        let stage = stage.advance(InstanceStage::Launched);

        let mut instance = Instance::new(id.clone(), port, launched.pid);
        instance.log_file = Some(launched.log_file);
        if let Err(e) = self.registry.record(&instance).await {
            // An untracked worker could never be stopped; take it down now.
            if let Err(sig) = self.signaller.terminate_group(instance.pid) {
                tracing::warn!(instance = %id, pid = instance.pid, error = %sig, "cannot terminate untracked worker");
            }
            ledger.forget(instance.pid);
            return skip(stage, SkipReason::Persistence, &format!("{e:#}"));
        }
        reporter.success(&format!(
            "instance {id} started on port {port} (pid {})",
            instance.pid
        ));
        LaunchStep::Launched { instance, key, stage }
    }

    /// Variables every worker receives on top of the inherited environment.
    fn instance_env(&self, id: &str, key: &SecretKey) -> EnvMap {
        EnvMap::from([
            ("RSU_ID".to_string(), id.to_string()),
            ("GANACHE_PRIVATE_KEY".to_string(), key.expose().to_string()),
            (
                "LOG_DIR".to_string(),
                self.options.logs_dir.display().to_string(),
            ),
        ])
    }

    async fn load_previous_manifest(&self) -> Option<DeploymentManifest> {
        match self.manifests.load_manifest().await {
            Ok(manifest) => manifest,
            Err(e) => {
                tracing::warn!(error = %e, "previous manifest unreadable; starting a new generation");
                None
            }
        }
    }

    async fn terminate_launched(&self, ledger: &LaunchLedger, reporter: &impl ProgressReporter) -> usize {
        let mut terminated = 0;
        for (id, pid) in ledger.take() {
            match self.signaller.terminate_group(pid) {
                Ok(outcome) => {
                    terminated += 1;
                    tracing::info!(instance = %id, pid, ?outcome, "terminated after interrupt");
                    if let Err(e) = self.registry.remove(&id).await {
                        reporter.warn(&format!("instance {id}: {e:#}"));
                    }
                }
                Err(e) => reporter.warn(&format!("instance {id} (pid {pid}): {e:#}")),
            }
        }
        terminated
    }

    /// Launch a single instance with a caller-chosen id and port.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::InvalidRequest`] for a bad or already managed
    /// id, [`FleetError::PortUnavailable`] for a busy or claimed port,
    /// [`FleetError::LaunchFailed`] when the worker cannot start, and
    /// persistence errors from the registry.
    pub async fn start(&self, id: &str, port: u16) -> Result<Instance> {
        validate_instance_id(id)?;
        if self.registry.lookup(id).await?.is_some() {
            return Err(FleetError::InvalidRequest(format!(
                "Instance {id} is already managed. Stop it first with 'rsufleet stop --id {id}'."
            ))
            .into());
        }
        let existing = self.registry.list_all().await?;
        let allocator = PortAllocator::new(self.ports, &existing);
        if allocator.allocate(port).await? == PortAvailability::InUse {
            return Err(FleetError::PortUnavailable { port }.into());
        }

        let key = SecretKey::generate();
        let request = LaunchRequest {
            id: id.to_string(),
            port,
            overrides: self.instance_env(id, &key),
        };
        let launched = self
            .launcher
            .launch(&request)
            .await
            .map_err(|e| e.into_fleet_error(id))?;

        let mut instance = Instance::new(id, port, launched.pid);
        instance.log_file = Some(launched.log_file);
        if let Err(e) = self.registry.record(&instance).await {
            if let Err(sig) = self.signaller.terminate_group(instance.pid) {
                tracing::warn!(instance = %id, pid = instance.pid, error = %sig, "cannot terminate untracked worker");
            }
            return Err(e);
        }
        Ok(instance)
    }

    /// Signal one instance's process group and drop its record.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::ProcessNotFound`] for an unknown id. A signal
    /// the OS rejects keeps the record and is returned as an error.
    pub async fn stop(&self, id: &str) -> Result<StopReport> {
        let instance = self
            .registry
            .lookup(id)
            .await?
            .ok_or_else(|| FleetError::ProcessNotFound(id.to_string()))?;
        self.stop_instance(&instance).await
    }

    async fn stop_instance(&self, instance: &Instance) -> Result<StopReport> {
        let outcome = match self.signaller.terminate_group(instance.pid)? {
            SignalOutcome::Delivered => StopOutcome::Terminated,
            SignalOutcome::NoSuchProcess => StopOutcome::AlreadyExited,
        };
        tracing::info!(instance = %instance.id, pid = instance.pid, ?outcome, "instance stopped");
        self.registry.remove(&instance.id).await?;
        Ok(StopReport {
            id: instance.id.clone(),
            pid: instance.pid,
            port: instance.port,
            outcome,
        })
    }

    /// Stop every registered instance independently, then rewrite the manifest
    /// with whatever is still registered.
    ///
    /// # Errors
    ///
    /// Returns an error only when the registry cannot be listed or the
    /// manifest cannot be written. Individual stop failures are reported.
    pub async fn stop_all(&self, reporter: &impl ProgressReporter) -> Result<StopAllReport> {
        let mut report = StopAllReport::default();
        for instance in self.registry.list_all().await? {
            match self.stop_instance(&instance).await {
                Ok(stopped) => {
                    match stopped.outcome {
                        StopOutcome::Terminated => reporter.success(&format!(
                            "stopped instance {} (pid {})",
                            stopped.id, stopped.pid
                        )),
                        StopOutcome::AlreadyExited => reporter.success(&format!(
                            "instance {} (pid {}) had already exited",
                            stopped.id, stopped.pid
                        )),
                    }
                    report.stopped.push(stopped);
                }
                Err(e) => {
                    reporter.warn(&format!("instance {} (pid {}): {e:#}", instance.id, instance.pid));
                    report.failed.push(StopFailure {
                        id: instance.id.clone(),
                        pid: instance.pid,
                        error: format!("{e:#}"),
                    });
                }
            }
        }

        let remaining = self.registry.list_all().await?;
        let previous = self.load_previous_manifest().await;
        if previous.is_some() || !remaining.is_empty() {
            let manifest = DeploymentManifest::succeed(
                previous.as_ref(),
                remaining.iter().map(InstanceSnapshot::from).collect(),
            );
            self.manifests.save_manifest(&manifest).await?;
            report.generation = Some(manifest.generation);
        }
        Ok(report)
    }

    /// Liveness of one instance. Never mutates state.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::ProcessNotFound`] for an unknown id.
    pub async fn status(&self, id: &str) -> Result<InstanceStatus> {
        let instance = self
            .registry
            .lookup(id)
            .await?
            .ok_or_else(|| FleetError::ProcessNotFound(id.to_string()))?;
        Ok(self.with_liveness(instance))
    }

    /// Every record with liveness; dead ones are flagged, not pruned.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be read.
    pub async fn list(&self) -> Result<Vec<InstanceStatus>> {
        Ok(self
            .registry
            .list_all()
            .await?
            .into_iter()
            .map(|inst| self.with_liveness(inst))
            .collect())
    }

    fn with_liveness(&self, instance: Instance) -> InstanceStatus {
        let alive = self.signaller.is_alive(instance.pid);
        if !alive {
            tracing::debug!(instance = %instance.id, pid = instance.pid, "stale registry entry");
        }
        InstanceStatus { instance, alive }
    }
}
