//! Instance domain types and pure validation functions.
//!
//! This module is free of I/O and async. All functions take data in and
//! return data out.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::FleetError;
use crate::domain::registration::RegistrationOutcome;

/// Longest accepted instance id.
pub const MAX_INSTANCE_ID_LEN: usize = 64;

/// Launch facts of one managed worker, persisted as `pids/rsu_<id>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Logical identity, unique within the registry.
    pub id: String,
    /// Loopback port the worker listens on.
    pub port: u16,
    /// Pid of the worker, which is also its process-group id.
    pub pid: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Outcome of the registrar call, when one was made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<RegistrationOutcome>,
}

impl Instance {
    #[must_use]
    pub fn new(id: impl Into<String>, port: u16, pid: u32) -> Self {
        Self {
            id: id.into(),
            port,
            pid,
            created_at: Utc::now(),
            log_file: None,
            registration: None,
        }
    }

    /// Base URL of the worker's HTTP API.
    #[must_use]
    pub fn url(&self) -> String {
        instance_url(self.port)
    }
}

/// Base URL of a worker listening on `port`.
#[must_use]
pub fn instance_url(port: u16) -> String {
    format!("http://localhost:{port}")
}

/// A registry entry cross-checked against the OS.
///
/// `alive == false` marks a stale entry: the record stays until an explicit
/// stop removes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceStatus {
    #[serde(flatten)]
    pub instance: Instance,
    pub alive: bool,
}

impl InstanceStatus {
    #[must_use]
    pub fn is_stale(&self) -> bool {
        !self.alive
    }
}

/// Validates an instance id.
///
/// Ids become part of file names, so they are limited to 1–64 characters of
/// `[A-Za-z0-9_-]`.
///
/// # Errors
///
/// Returns [`FleetError::InvalidRequest`] if the id is empty, too long, or
/// contains other characters.
pub fn validate_instance_id(id: &str) -> Result<(), FleetError> {
    let ok = !id.is_empty()
        && id.len() <= MAX_INSTANCE_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(FleetError::InvalidRequest(format!(
            "Invalid instance id '{id}': use 1-{MAX_INSTANCE_ID_LEN} letters, digits, '-' or '_'"
        )))
    }
}

/// Sort key placing numeric ids in numeric order ahead of named ones.
#[must_use]
pub fn id_sort_key(id: &str) -> (u64, String) {
    (id.parse::<u64>().unwrap_or(u64::MAX), id.to_string())
}

/// Order instances by launch time, breaking ties by id.
pub fn sort_by_launch(instances: &mut [Instance]) {
    instances.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}
