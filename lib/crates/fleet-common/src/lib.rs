//! Types shared by the `rsufleet` manager and the `obu-runner` client.

pub mod client;
pub mod vehicle;

pub use client::{
    ClientSettings, DEFAULT_EDGE_SERVERS, DEFAULT_HTTP_BACKOFF_SECS, DEFAULT_HTTP_RETRIES,
    EDGE_SERVERS_ENV, EDGE_SERVERS_FALLBACK_ENV, parse_edge_servers,
};
pub use vehicle::{Vehicle, VehicleCategory, VehicleError, parse_vehicles};
