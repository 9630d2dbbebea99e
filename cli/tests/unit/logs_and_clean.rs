//! Log excerpts and state clean-up on a real filesystem.

#![allow(clippy::unwrap_used)]

use chrono::TimeZone as _;
use chrono::Utc;
use rsu_fleet_cli::application::services::cleanup::{CleanOptions, apply_clean, plan_clean};
use rsu_fleet_cli::application::services::logs::instance_logs;
use rsu_fleet_cli::infra::fs::StdFs;
use rsu_fleet_cli::infra::state::StateLayout;

use crate::fakes::RecordingReporter;

#[test]
fn logs_match_instance_id_exactly() {
    let tmp = tempfile::tempdir().unwrap();
    let logs = tmp.path();
    for (name, body) in [
        ("rsu_1_3000.log", "first run"),
        ("rsu_1_3005.log", "second run"),
        ("rsu_10_3000.log", "other instance"),
        ("rsu_1_x.log", "not a port"),
        ("obu_veh1.log", "vehicle"),
    ] {
        std::fs::write(logs.join(name), body).unwrap();
    }

    let excerpts = instance_logs(&StdFs, logs, "1", 100).unwrap();

    let names: Vec<String> = excerpts
        .iter()
        .map(|e| e.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["rsu_1_3000.log", "rsu_1_3005.log"]);
    assert_eq!(excerpts[1].text, "second run");
}

#[test]
fn long_logs_are_cut_on_char_boundaries() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("rsu_2_3001.log"), "é".repeat(50)).unwrap();

    let excerpts = instance_logs(&StdFs, tmp.path(), "2", 10).unwrap();

    assert_eq!(excerpts[0].text.chars().count(), 10);
    assert!(excerpts[0].truncated);
}

#[test]
fn missing_logs_dir_has_no_logs() {
    let tmp = tempfile::tempdir().unwrap();
    let excerpts = instance_logs(&StdFs, &tmp.path().join("nope"), "1", 10).unwrap();
    assert!(excerpts.is_empty());
}

fn seeded_state() -> (tempfile::TempDir, StateLayout) {
    let tmp = tempfile::tempdir().unwrap();
    let layout = StateLayout::new(tmp.path().join("state"));
    std::fs::create_dir_all(layout.logs_dir()).unwrap();
    std::fs::write(layout.manifest(), r#"{"generation":1,"timestamp":"2024-01-01T00:00:00Z","instances":[]}"#).unwrap();
    std::fs::write(layout.logs_dir().join("rsu_1_3000.log"), "x").unwrap();
    std::fs::write(layout.logs_dir().join("obu_veh1.log"), "y").unwrap();
    (tmp, layout)
}

#[test]
fn dry_run_plan_touches_nothing() {
    let (_tmp, layout) = seeded_state();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    let plan = plan_clean(
        &StdFs,
        CleanOptions { archive: true, logs: true },
        &layout.manifest(),
        &layout.archive_dir(),
        &layout.logs_dir(),
        now,
    )
    .unwrap();

    let (_, to) = plan.archive.clone().unwrap();
    assert_eq!(to, layout.archive_dir().join("deployment-20240501T120000Z.json"));
    assert_eq!(plan.remove_logs.len(), 2);
    assert!(layout.manifest().is_file());
    assert!(!layout.archive_dir().exists());
}

#[test]
fn apply_archives_manifest_and_removes_logs() {
    let (_tmp, layout) = seeded_state();
    let reporter = RecordingReporter::default();
    let plan = plan_clean(
        &StdFs,
        CleanOptions { archive: true, logs: true },
        &layout.manifest(),
        &layout.archive_dir(),
        &layout.logs_dir(),
        Utc::now(),
    )
    .unwrap();

    let removed = apply_clean(&StdFs, &plan, &reporter).unwrap();

    assert_eq!(removed, 2);
    assert!(!layout.manifest().exists());
    let (_, archived) = plan.archive.unwrap();
    assert!(archived.is_file());
    assert!(std::fs::read_dir(layout.logs_dir()).unwrap().next().is_none());
}

#[test]
fn archive_without_manifest_is_a_no_op() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = StateLayout::new(tmp.path().to_path_buf());

    let plan = plan_clean(
        &StdFs,
        CleanOptions { archive: true, logs: false },
        &layout.manifest(),
        &layout.archive_dir(),
        &layout.logs_dir(),
        Utc::now(),
    )
    .unwrap();

    assert!(plan.is_empty());
}
