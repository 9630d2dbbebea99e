//! Domain layer: pure fleet types, validation, and renderings.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod deploy;
pub mod env;
pub mod error;
pub mod health;
pub mod instance;
pub mod manifest;
pub mod obu;
pub mod port;
pub mod projection;
pub mod registration;

pub use config::FleetConfig;
pub use deploy::{DeployReport, DeployRequest, InstanceOutcome, InstanceStage, SkipReason};
pub use error::{FleetError, LaunchError};
pub use health::{HealthReport, HealthSummary, HealthVerdict, HttpProbeResponse, InstanceHealth};
pub use instance::{Instance, InstanceStatus, validate_instance_id};
pub use manifest::{DeploymentManifest, InstanceSnapshot};
pub use port::PortAvailability;
pub use registration::{RegistrationOutcome, RegistrationResult, SecretKey};
