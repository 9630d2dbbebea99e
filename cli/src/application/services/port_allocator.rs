//! Application service: port allocation.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::collections::BTreeSet;

use anyhow::Result;

use crate::application::ports::PortProbe;
use crate::domain::port::{PortAvailability, allocate_range};
use crate::domain::{FleetError, Instance};

/// Decides whether candidate ports may be used by a new instance.
///
/// A port is in use when the OS reports it bound, or when any registry
/// record (live or stale) already claims it. Nothing is reserved.
pub struct PortAllocator<'a, P: PortProbe> {
    probe: &'a P,
    claimed: BTreeSet<u16>,
}

impl<'a, P: PortProbe> PortAllocator<'a, P> {
    #[must_use]
    pub fn new(probe: &'a P, registry_records: &[Instance]) -> Self {
        Self {
            probe,
            claimed: registry_records.iter().map(|i| i.port).collect(),
        }
    }

    /// Candidate ports `start..start+count-1`; validation is per port.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::InvalidRequest`] when the range overflows.
    pub fn candidates(start: u16, count: u16) -> Result<Vec<u16>, FleetError> {
        allocate_range(start, count)
    }

    /// Check one candidate port.
    ///
    /// # Errors
    ///
    /// Returns an error if the probe itself fails.
    pub async fn allocate(&self, port: u16) -> Result<PortAvailability> {
        if self.claimed.contains(&port) {
            tracing::debug!(port, "port claimed by a registry record");
            return Ok(PortAvailability::InUse);
        }
        let availability = self.probe.check(port).await?;
        tracing::debug!(port, ?availability, "port probed");
        Ok(availability)
    }
}
