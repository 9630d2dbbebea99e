//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`, never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod cleanup;
pub mod fleet;
pub mod health_checker;
pub mod logs;
pub mod obu_fleet;
pub mod port_allocator;
pub mod preflight;
pub mod registration;
pub mod worker_launcher;
