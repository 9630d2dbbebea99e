use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading vehicle definitions.
#[derive(Debug, Error)]
pub enum VehicleError {
    #[error("Invalid vehicle category {0}: expected 0 (normal), 1 (emergency) or 2 (rsu)")]
    InvalidCategory(u8),

    #[error("Invalid vehicles file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Vehicle entry {index} has an empty vehicleId")]
    MissingId { index: usize },
}

/// Vehicle class as understood by the edge servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum VehicleCategory {
    #[default]
    Normal,
    Emergency,
    Rsu,
}

impl VehicleCategory {
    /// Numeric wire value.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Emergency => 1,
            Self::Rsu => 2,
        }
    }

    #[must_use]
    pub fn is_emergency(self) -> bool {
        self == Self::Emergency
    }
}

impl TryFrom<u8> for VehicleCategory {
    type Error = VehicleError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Normal),
            1 => Ok(Self::Emergency),
            2 => Ok(Self::Rsu),
            other => Err(VehicleError::InvalidCategory(other)),
        }
    }
}

impl From<VehicleCategory> for u8 {
    fn from(value: VehicleCategory) -> Self {
        value.code()
    }
}

/// One entry of a vehicles file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub vehicle_private_key: String,
    pub vehicle_id: String,
    #[serde(default)]
    pub vehicle_category: VehicleCategory,
    /// Pins the vehicle to one edge server instead of random selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_server: Option<String>,
}

/// Parse the JSON array stored in a vehicles file.
pub fn parse_vehicles(content: &str) -> Result<Vec<Vehicle>, VehicleError> {
    let vehicles: Vec<Vehicle> = serde_json::from_str(content)?;
    if let Some(index) = vehicles.iter().position(|v| v.vehicle_id.trim().is_empty()) {
        return Err(VehicleError::MissingId { index });
    }
    Ok(vehicles)
}
