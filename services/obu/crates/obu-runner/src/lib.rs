//! Simulated on-board unit (OBU).
//!
//! One `obu-runner` process plays one vehicle: it optionally registers with
//! an edge server, then periodically submits random sensor readings until
//! it receives SIGINT or SIGTERM.

pub mod client;
pub mod sensor;

pub use client::ObuClient;
pub use sensor::SensorData;
