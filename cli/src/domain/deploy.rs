//! Deploy request validation and per-instance outcome types.

use serde::Serialize;

use crate::domain::error::FleetError;
use crate::domain::instance::id_sort_key;
use crate::domain::port::{MAX_DEPLOY_PORT, MIN_DEPLOY_PORT};
use crate::domain::registration::RegistrationResult;

/// Largest fleet a single deploy may start.
pub const MAX_DEPLOY_COUNT: u16 = 100;

/// Operator input for one deploy run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    pub count: u16,
    pub start_port: u16,
}

impl DeployRequest {
    /// Validates count and start port.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::InvalidRequest`] outside `1..=100` instances or
    /// a start port outside `1024..=65000`.
    pub fn validate(&self) -> Result<(), FleetError> {
        if !(1..=MAX_DEPLOY_COUNT).contains(&self.count) {
            return Err(FleetError::InvalidRequest(format!(
                "Count must be between 1 and {MAX_DEPLOY_COUNT}, got {}",
                self.count
            )));
        }
        if !(MIN_DEPLOY_PORT..=MAX_DEPLOY_PORT).contains(&self.start_port) {
            return Err(FleetError::InvalidRequest(format!(
                "Start port must be between {MIN_DEPLOY_PORT} and {MAX_DEPLOY_PORT}, got {}",
                self.start_port
            )));
        }
        Ok(())
    }

    /// Positional instance id for the `index`-th (0-based) candidate.
    #[must_use]
    pub fn instance_id(index: usize) -> String {
        (index + 1).to_string()
    }
}

/// Pipeline stage reached by one instance.
///
/// `Requested → PortChecked → Launched → Registered → Recorded`, with
/// `Skipped` terminal for port or launch failures and for a launched
/// worker whose record cannot be written. A failed registration still
/// advances to `Registered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStage {
    Requested,
    PortChecked,
    Launched,
    Registered,
    Recorded,
    Skipped,
}

impl InstanceStage {
    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Requested, Self::PortChecked | Self::Skipped)
                | (Self::PortChecked, Self::Launched | Self::Skipped)
                | (Self::Launched, Self::Registered | Self::Skipped)
                | (Self::Registered, Self::Recorded)
        )
    }

    /// Move to `next`, which must be a legal successor.
    #[must_use]
    pub fn advance(self, next: Self) -> Self {
        debug_assert!(
            self.can_advance_to(next),
            "illegal stage transition {self:?} -> {next:?}"
        );
        next
    }
}

/// Final state of one requested instance.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceOutcome {
    pub id: String,
    pub port: u16,
    pub stage: InstanceStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<RegistrationResult>,
    /// Last stage reached before the instance was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_at: Option<InstanceStage>,
    /// Why the instance was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub failure: Option<SkipReason>,
}

/// Typed reason behind a `Skipped` outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The positional id already belongs to a managed instance.
    IdInUse,
    PortUnavailable,
    LaunchFailed,
    Persistence,
}

impl InstanceOutcome {
    /// An instance dropped out of the pipeline while at `reached`.
    #[must_use]
    pub fn skipped(
        id: String,
        port: u16,
        reached: InstanceStage,
        reason: SkipReason,
        err: &dyn std::fmt::Display,
    ) -> Self {
        Self {
            id,
            port,
            stage: reached.advance(InstanceStage::Skipped),
            pid: None,
            registration: None,
            skipped_at: Some(reached),
            error: Some(err.to_string()),
            failure: Some(reason),
        }
    }

    /// A registered instance whose record was written.
    #[must_use]
    pub fn recorded(
        id: String,
        port: u16,
        pid: u32,
        reached: InstanceStage,
        registration: RegistrationResult,
    ) -> Self {
        Self {
            id,
            port,
            stage: reached.advance(InstanceStage::Recorded),
            pid: Some(pid),
            registration: Some(registration),
            skipped_at: None,
            error: None,
            failure: None,
        }
    }

    #[must_use]
    pub fn is_recorded(&self) -> bool {
        self.stage == InstanceStage::Recorded
    }
}

/// Aggregate result of a deploy run.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub requested: usize,
    pub deployed: usize,
    pub skipped: usize,
    pub registered: usize,
    pub registration_failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
    pub instances: Vec<InstanceOutcome>,
}

impl DeployReport {
    /// Summarise outcomes, ordered by numeric id where possible.
    #[must_use]
    pub fn new(mut instances: Vec<InstanceOutcome>, generation: Option<u64>) -> Self {
        instances.sort_by_key(|o| id_sort_key(&o.id));
        let deployed = instances.iter().filter(|o| o.is_recorded()).count();
        let registered = instances
            .iter()
            .filter(|o| o.registration.as_ref().is_some_and(|r| r.success))
            .count();
        let registration_failed = instances
            .iter()
            .filter(|o| o.registration.as_ref().is_some_and(|r| !r.success))
            .count();
        Self {
            requested: instances.len(),
            deployed,
            skipped: instances.len() - deployed,
            registered,
            registration_failed,
            generation,
            instances,
        }
    }

    /// At least one instance reached `Recorded`.
    #[must_use]
    pub fn any_deployed(&self) -> bool {
        self.deployed > 0
    }
}
