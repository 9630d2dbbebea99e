//! Worker launches with real `sh` processes.

#![cfg(unix)]
#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::time::Duration;

use rsu_fleet_cli::application::ports::{LaunchRequest, ProcessSignaller, SignalOutcome, WorkerLauncher};
use rsu_fleet_cli::application::services::fleet::{FleetController, FleetOptions};
use rsu_fleet_cli::application::services::worker_launcher::{EdgeWorkerLauncher, worker_log_path};
use rsu_fleet_cli::domain::config::WorkerConfig;
use rsu_fleet_cli::domain::env::EnvMap;
use rsu_fleet_cli::domain::{FleetError, LaunchError};
use rsu_fleet_cli::infra::fs::StdFs;
use rsu_fleet_cli::infra::process::{NixSignaller, TokioProcessSpawner};
use tempfile::TempDir;

use crate::fakes::{BusyPorts, FakeRegistration, MemoryStore, RecordingReporter, RegistrarMode};
use crate::helpers::deploy_opts;

type ShellLauncher = EdgeWorkerLauncher<TokioProcessSpawner, BusyPorts, StdFs>;

fn worker(dir: &Path, script: &str) -> WorkerConfig {
    WorkerConfig {
        dir: dir.to_path_buf(),
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        install: Vec::new(),
        startup_grace_ms: 300,
        ..WorkerConfig::default()
    }
}

fn inherited(extra: &[(&str, &str)]) -> EnvMap {
    let mut env = EnvMap::from([(
        "PATH".to_string(),
        std::env::var("PATH").unwrap_or_else(|_| "/usr/bin:/bin".to_string()),
    )]);
    env.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    env
}

fn launcher(tmp: &TempDir, script: &str, ports: BusyPorts, env: EnvMap) -> ShellLauncher {
    EdgeWorkerLauncher::new(
        TokioProcessSpawner,
        ports,
        StdFs,
        worker(tmp.path(), script),
        tmp.path().join("logs"),
        env,
    )
}

fn request(id: &str, port: u16, overrides: &[(&str, &str)]) -> LaunchRequest {
    LaunchRequest {
        id: id.to_string(),
        port,
        overrides: overrides
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

#[tokio::test]
async fn long_running_worker_is_launched_in_its_own_group() {
    let tmp = tempfile::tempdir().unwrap();
    let launcher = launcher(&tmp, "sleep 30", BusyPorts::none(), inherited(&[]));

    let launched = launcher.launch(&request("1", 4100, &[])).await.unwrap();

    assert_eq!(launched.log_file, worker_log_path(&tmp.path().join("logs"), "1", 4100));
    assert!(launched.log_file.is_file());
    let signaller = NixSignaller;
    assert!(signaller.is_alive(launched.pid));
    assert_eq!(
        signaller.terminate_group(launched.pid).unwrap(),
        SignalOutcome::Delivered
    );
}

#[tokio::test]
async fn environment_is_layered() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(
        tmp.path().join(".env"),
        "FROM_DEFAULTS=yes\nSHADOWED=default\n# comment\n",
    )
    .unwrap();
    let script = r#"echo "port=$PORT id=$RSU_ID defaults=$FROM_DEFAULTS shadowed=$SHADOWED"; sleep 30"#;
    let launcher = launcher(
        &tmp,
        script,
        BusyPorts::none(),
        inherited(&[("SHADOWED", "inherited"), ("RSU_ID", "outer")]),
    );

    let launched = launcher
        .launch(&request("7", 4107, &[("RSU_ID", "7")]))
        .await
        .unwrap();

    let log = std::fs::read_to_string(&launched.log_file).unwrap();
    assert!(
        log.contains("port=4107 id=7 defaults=yes shadowed=inherited"),
        "log was: {log}"
    );
    NixSignaller.terminate_group(launched.pid).unwrap();
}

#[tokio::test]
async fn early_exit_is_a_failed_launch() {
    let tmp = tempfile::tempdir().unwrap();
    let launcher = launcher(&tmp, "echo boom >&2; exit 3", BusyPorts::none(), inherited(&[]));

    let err = launcher.launch(&request("2", 4102, &[])).await.unwrap_err();

    let LaunchError::ExitedEarly { status, log_file } = err else {
        panic!("expected ExitedEarly, got {err:?}");
    };
    assert!(status.contains('3'), "status: {status}");
    assert!(std::fs::read_to_string(log_file).unwrap().contains("boom"));
}

#[tokio::test]
async fn log_is_appended_across_launches() {
    let tmp = tempfile::tempdir().unwrap();
    let launcher = launcher(&tmp, "echo run; exit 1", BusyPorts::none(), inherited(&[]));

    for _ in 0..2 {
        let _ = launcher.launch(&request("3", 4103, &[])).await.unwrap_err();
    }

    let log = std::fs::read_to_string(worker_log_path(&tmp.path().join("logs"), "3", 4103)).unwrap();
    assert_eq!(log.matches("run").count(), 2);
}

#[tokio::test]
async fn missing_program_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let mut launcher_cfg = worker(tmp.path(), "");
    launcher_cfg.program = "definitely-not-a-real-binary-rsu".to_string();
    let launcher = EdgeWorkerLauncher::new(
        TokioProcessSpawner,
        BusyPorts::none(),
        StdFs,
        launcher_cfg,
        tmp.path().join("logs"),
        inherited(&[]),
    );

    let err = launcher.launch(&request("4", 4104, &[])).await.unwrap_err();

    assert!(matches!(err, LaunchError::ExecutableNotFound { .. }), "got {err:?}");
}

#[tokio::test]
async fn port_taken_since_allocation_is_rechecked() {
    let tmp = tempfile::tempdir().unwrap();
    let launcher = launcher(&tmp, "sleep 30", BusyPorts::of(&[4105]), inherited(&[]));

    let started = std::time::Instant::now();
    let err = launcher.launch(&request("5", 4105, &[])).await.unwrap_err();

    assert_eq!(err, LaunchError::PortInUse { port: 4105 });
    assert!(started.elapsed() < Duration::from_millis(300));
    assert!(!tmp.path().join("logs").exists());
}

#[test]
fn spec_sets_port_and_keeps_inherited_variables() {
    let tmp = tempfile::tempdir().unwrap();
    let launcher = launcher(&tmp, "true", BusyPorts::none(), inherited(&[("HOME", "/home/rsu")]));

    let spec = launcher.spec_for(&request("8", 4108, &[("PORT", "1")]));

    assert_eq!(spec.env.get("PORT").map(String::as_str), Some("4108"));
    assert_eq!(spec.env.get("HOME").map(String::as_str), Some("/home/rsu"));
    assert_eq!(spec.cwd, tmp.path());
    assert_eq!(spec.startup_grace, Duration::from_millis(300));
}

#[tokio::test]
async fn interrupt_during_startup_grace_terminates_the_worker() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = worker(tmp.path(), "sleep 1; echo survived > survived");
    config.startup_grace_ms = 2000;
    let launcher = EdgeWorkerLauncher::new(
        TokioProcessSpawner,
        BusyPorts::none(),
        StdFs,
        config,
        tmp.path().join("logs"),
        inherited(&[]),
    );
    let store = MemoryStore::default();
    let ports = BusyPorts::none();
    let registration = FakeRegistration::new(RegistrarMode::Succeed);
    let controller = FleetController {
        registry: &store,
        manifests: &store,
        launcher: &launcher,
        ports: &ports,
        registration: &registration,
        signaller: &NixSignaller,
        options: FleetOptions {
            parallelism: 1,
            logs_dir: tmp.path().join("logs"),
        },
    };

    let err = controller
        .deploy_until(
            &deploy_opts(1, 4110),
            &RecordingReporter::default(),
            tokio::time::sleep(Duration::from_millis(300)),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<FleetError>(),
        Some(FleetError::Cancelled { .. })
    ));
    assert!(store.ids().is_empty());
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(
        !tmp.path().join("survived").exists(),
        "worker outlived the interrupted deploy"
    );
}
