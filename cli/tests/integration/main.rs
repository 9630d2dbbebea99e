//! Integration tests for the rsufleet CLI
//!
//! These tests spawn the actual binary against temporary state directories
//! and test end-to-end behavior. They are slower and should be run
//! separately from unit tests.

mod state_commands;

use assert_cmd::Command;

/// The binary with a private state directory and no inherited overrides.
pub fn rsufleet(state_dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("rsufleet"));
    cmd.env("NO_COLOR", "1")
        .env_remove("RSU_FLEET_CONFIG")
        .env_remove("RSU_FLEET_WORKER_DIR")
        .env_remove("RSU_FLEET_STATE_DIR")
        .env_remove("RUST_LOG")
        .arg("--state-dir")
        .arg(state_dir);
    cmd
}
