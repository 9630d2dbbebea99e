//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process spawning and
//! signalling, external commands, loopback port probes, HTTP calls to
//! workers, and the on-disk state directory.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod command_runner;
pub mod config;
pub mod fs;
pub mod http;
pub mod network;
pub mod process;
pub mod registrar;
pub mod state;
