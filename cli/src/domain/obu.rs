//! Simulated-client (OBU) fleet bookkeeping.

use std::collections::BTreeMap;

use fleet_common::Vehicle;

/// Tracked simulated clients, vehicle id → pid. Stored as `obu_pids.json`.
pub type ObuPidMap = BTreeMap<String, u32>;

/// The first `count` vehicles, or all of them.
#[must_use]
pub fn select_vehicles(vehicles: Vec<Vehicle>, count: Option<usize>) -> Vec<Vehicle> {
    match count {
        Some(n) => vehicles.into_iter().take(n).collect(),
        None => vehicles,
    }
}

/// Command-line arguments for one `obu-runner` process.
#[must_use]
pub fn runner_args(vehicle: &Vehicle) -> Vec<String> {
    let mut args = vec![
        "--private-key".to_string(),
        vehicle.vehicle_private_key.clone(),
        "--vehicle-id".to_string(),
        vehicle.vehicle_id.clone(),
        "--category".to_string(),
        vehicle.vehicle_category.code().to_string(),
        "--register".to_string(),
    ];
    if let Some(edge) = &vehicle.edge_server {
        args.push("--edge-server".to_string());
        args.push(edge.clone());
    }
    args
}

/// File-name-safe form of a vehicle id.
#[must_use]
pub fn log_stem(vehicle_id: &str) -> String {
    vehicle_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
