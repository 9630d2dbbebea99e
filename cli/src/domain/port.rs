//! Port candidates and availability.

use serde::Serialize;

use crate::domain::error::FleetError;

/// Lowest start port accepted by `deploy`.
pub const MIN_DEPLOY_PORT: u16 = 1024;

/// Highest start port accepted by `deploy`.
pub const MAX_DEPLOY_PORT: u16 = 65000;

/// Result of a loopback bindability check. The port is not reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PortAvailability {
    Available,
    InUse,
}

/// Candidate ports `start..start+count-1`, unfiltered and in order.
///
/// # Errors
///
/// Returns [`FleetError::InvalidRequest`] when the range runs past `u16::MAX`.
pub fn allocate_range(start: u16, count: u16) -> Result<Vec<u16>, FleetError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let last = start.checked_add(count - 1).ok_or_else(|| {
        FleetError::InvalidRequest(format!(
            "Port range {start}+{count} exceeds {}",
            u16::MAX
        ))
    })?;
    Ok((start..=last).collect())
}
