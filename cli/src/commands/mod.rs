//! Command implementations

pub mod clean;
pub mod config;
pub mod deploy;
pub mod health;
pub mod logs;
pub mod obu;
pub mod projection;
pub mod start;
pub mod stats;
pub mod status;
pub mod stop;
pub mod version;
