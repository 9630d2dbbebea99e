//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::path::PathBuf;

use thiserror::Error;

// ── Fleet errors ──────────────────────────────────────────────────────────────

/// Failures surfaced by fleet lifecycle operations.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("Port {port} is already in use")]
    PortUnavailable { port: u16 },

    #[error("Failed to launch instance {id}: {reason}")]
    LaunchFailed { id: String, reason: String },

    #[error("Instance {id} is unreachable: {cause}")]
    HealthUnreachable { id: String, cause: String },

    #[error("Instance {id} returned a malformed health response: {cause}")]
    HealthMalformed { id: String, cause: String },

    #[error("Registration of instance {id} failed: {detail}")]
    RegistrationFailed { id: String, detail: String },

    #[error("Instance {0} not found. Run 'rsufleet list' to see managed instances.")]
    ProcessNotFound(String),

    #[error("Cannot {action} {}: {reason}", path.display())]
    Persistence {
        action: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Deployment interrupted; sent termination to {terminated} launched instance(s)")]
    Cancelled { terminated: usize },
}

impl FleetError {
    /// Stable machine-readable code used by `--json` error output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::PortUnavailable { .. } => "PORT_UNAVAILABLE",
            Self::LaunchFailed { .. } => "LAUNCH_FAILED",
            Self::HealthUnreachable { .. } => "HEALTH_UNREACHABLE",
            Self::HealthMalformed { .. } => "HEALTH_MALFORMED",
            Self::RegistrationFailed { .. } => "REGISTRATION_FAILED",
            Self::ProcessNotFound(_) => "PROCESS_NOT_FOUND",
            Self::Persistence { .. } => "PERSISTENCE_ERROR",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Cancelled { .. } => "CANCELLED",
        }
    }
}

// ── Launch errors ─────────────────────────────────────────────────────────────

/// Why a single worker process could not be started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    #[error("executable '{program}' not found")]
    ExecutableNotFound { program: String },

    #[error("port {port} became busy before launch")]
    PortInUse { port: u16 },

    #[error("spawn failed: {0}")]
    Spawn(String),

    #[error("process exited during startup ({status}); see {}", log_file.display())]
    ExitedEarly { status: String, log_file: PathBuf },

    #[error("cannot open log file {}: {reason}", path.display())]
    LogSink { path: PathBuf, reason: String },
}

impl LaunchError {
    /// Attach the instance identity and lift into the fleet taxonomy.
    #[must_use]
    pub fn into_fleet_error(self, id: &str) -> FleetError {
        match self {
            Self::PortInUse { port } => FleetError::PortUnavailable { port },
            other => FleetError::LaunchFailed {
                id: id.to_string(),
                reason: other.to_string(),
            },
        }
    }
}
