//! Commands that only read or reshape the state directory.

#![allow(clippy::unwrap_used)]

use std::path::Path;

use predicates::prelude::*;

use crate::rsufleet;

const MANIFEST: &str = r#"{
  "generation": 3,
  "timestamp": "2024-05-01T12:00:00Z",
  "instances": [
    {"id": "1", "port": 3000, "pid": 111, "url": "http://localhost:3000"},
    {"id": "2", "port": 3001, "pid": 112, "url": "http://localhost:3001",
     "registration": {"success": true, "tx_hash": "0xabc"}}
  ]
}"#;

fn seed(state: &Path) {
    std::fs::create_dir_all(state.join("logs")).unwrap();
    std::fs::write(state.join("deployment.json"), MANIFEST).unwrap();
    std::fs::write(state.join("logs/rsu_1_3000.log"), "listening on 3000\n").unwrap();
    std::fs::write(state.join("logs/rsu_2_3001.log"), "listening on 3001\n").unwrap();
}

#[test]
fn config_show_reports_defaults_and_path() {
    let tmp = tempfile::tempdir().unwrap();
    let out = rsufleet(tmp.path())
        .args(["config", "show", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert!(doc["path"].as_str().unwrap().ends_with("config.yaml"));
    assert_eq!(doc["config"]["worker"]["program"], "npm");
    assert_eq!(doc["config"]["deploy"]["parallelism"], 4);
}

#[test]
fn config_file_overrides_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(
        tmp.path().join("config.yaml"),
        "worker:\n  program: node\n  args: [server.js]\nhealth:\n  timeout_ms: 750\n",
    )
    .unwrap();
    rsufleet(tmp.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("node server.js"));
}

#[test]
fn malformed_config_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("config.yaml"), "worker: [not, a, map\n").unwrap();
    rsufleet(tmp.path())
        .arg("list")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("config.yaml"));
}

#[test]
fn lb_config_renders_upstream_for_manifest() {
    let tmp = tempfile::tempdir().unwrap();
    seed(tmp.path());
    rsufleet(tmp.path())
        .arg("lb-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("upstream edge_servers"))
        .stdout(predicate::str::contains("server localhost:3000;"))
        .stdout(predicate::str::contains("server localhost:3001;"))
        .stdout(predicate::str::contains("proxy_buffering off;"));
}

#[test]
fn docker_config_writes_output_file() {
    let tmp = tempfile::tempdir().unwrap();
    seed(tmp.path());
    let target = tmp.path().join("out/docker-compose.yml");
    rsufleet(tmp.path())
        .args(["docker-config", "-o"])
        .arg(&target)
        .assert()
        .success();
    let compose = std::fs::read_to_string(target).unwrap();
    assert!(compose.contains("edge-server-1:"));
    assert!(compose.contains("edge-server-2:"));
    assert!(compose.contains("ganache"));
}

#[test]
fn logs_show_instance_files() {
    let tmp = tempfile::tempdir().unwrap();
    seed(tmp.path());
    let out = rsufleet(tmp.path())
        .args(["logs", "--id", "1", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(doc["id"], "1");
    assert_eq!(doc["files"].as_array().unwrap().len(), 1);
    assert_eq!(doc["files"][0]["text"], "listening on 3000\n");
}

#[test]
fn clean_without_selection_is_a_hint() {
    let tmp = tempfile::tempdir().unwrap();
    seed(tmp.path());
    rsufleet(tmp.path())
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing selected"));
    assert!(tmp.path().join("deployment.json").is_file());
}

#[test]
fn clean_dry_run_leaves_state_alone() {
    let tmp = tempfile::tempdir().unwrap();
    seed(tmp.path());
    let out = rsufleet(tmp.path())
        .args(["clean", "--archive", "--logs", "--dry-run", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(doc["dry_run"], true);
    assert_eq!(doc["plan"]["remove_logs"].as_array().unwrap().len(), 2);
    assert!(tmp.path().join("deployment.json").is_file());
    assert!(tmp.path().join("logs/rsu_1_3000.log").is_file());
}

#[test]
fn clean_archives_manifest_and_removes_logs() {
    let tmp = tempfile::tempdir().unwrap();
    seed(tmp.path());
    rsufleet(tmp.path())
        .args(["clean", "--archive", "--logs"])
        .assert()
        .success();
    assert!(!tmp.path().join("deployment.json").exists());
    let archived: Vec<_> = std::fs::read_dir(tmp.path().join("archive"))
        .unwrap()
        .flatten()
        .collect();
    assert_eq!(archived.len(), 1);
    assert!(std::fs::read_dir(tmp.path().join("logs")).unwrap().next().is_none());
}

#[test]
fn obu_list_on_fresh_state_is_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let out = rsufleet(tmp.path())
        .args(["obu", "list", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(doc, serde_json::json!({ "obus": [] }));
}

#[test]
fn obu_start_with_missing_vehicles_file_fails() {
    let tmp = tempfile::tempdir().unwrap();
    rsufleet(tmp.path())
        .args(["obu", "start", "--vehicles-file"])
        .arg(tmp.path().join("missing.json"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing.json"));
}

#[test]
fn env_overrides_config_location_and_worker_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let elsewhere = tmp.path().join("custom.yaml");
    std::fs::write(&elsewhere, "deploy:\n  parallelism: 2\n").unwrap();
    let out = rsufleet(tmp.path())
        .env("RSU_FLEET_CONFIG", &elsewhere)
        .env("RSU_FLEET_WORKER_DIR", "/srv/edge")
        .args(["config", "show", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert!(doc["path"].as_str().unwrap().ends_with("custom.yaml"));
    assert_eq!(doc["config"]["deploy"]["parallelism"], 2);
    assert_eq!(doc["config"]["worker"]["dir"], "/srv/edge");
}
