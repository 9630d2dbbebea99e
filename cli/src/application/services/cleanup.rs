//! Application service: state-directory clean-up.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! A plan is computed first so `--dry-run` and the real run describe the
//! same actions.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::ports::{LocalFs, ProgressReporter};

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanOptions {
    pub archive: bool,
    pub logs: bool,
}

impl CleanOptions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.archive && !self.logs
    }
}

/// Actions a clean-up would perform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanPlan {
    /// Manifest move, `(from, to)`.
    pub archive: Option<(PathBuf, PathBuf)>,
    pub remove_logs: Vec<PathBuf>,
}

impl CleanPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archive.is_none() && self.remove_logs.is_empty()
    }
}

/// Archive file name for a manifest archived at `now`.
#[must_use]
pub fn archive_name(now: DateTime<Utc>) -> String {
    format!("deployment-{}.json", now.format("%Y%m%dT%H%M%SZ"))
}

/// Work out what `opts` would do.
///
/// # Errors
///
/// Returns an error when the logs directory cannot be listed.
pub fn plan_clean(
    fs: &impl LocalFs,
    opts: CleanOptions,
    manifest: &Path,
    archive_dir: &Path,
    logs_dir: &Path,
    now: DateTime<Utc>,
) -> Result<CleanPlan> {
    let archive = (opts.archive && fs.exists(manifest))
        .then(|| (manifest.to_path_buf(), archive_dir.join(archive_name(now))));
    let remove_logs = if opts.logs {
        fs.list_files(logs_dir)?
    } else {
        Vec::new()
    };
    Ok(CleanPlan {
        archive,
        remove_logs,
    })
}

/// Carry out `plan`. A log file that cannot be removed is reported and skipped.
///
/// # Errors
///
/// Returns an error when the manifest cannot be archived.
pub fn apply_clean(
    fs: &impl LocalFs,
    plan: &CleanPlan,
    reporter: &impl ProgressReporter,
) -> Result<usize> {
    if let Some((from, to)) = &plan.archive {
        fs.move_file(from, to)?;
        reporter.success(&format!("archived {} -> {}", from.display(), to.display()));
    }
    let mut removed = 0;
    for file in &plan.remove_logs {
        match fs.remove_file(file) {
            Ok(()) => removed += 1,
            Err(e) => reporter.warn(&format!("{e:#}")),
        }
    }
    if !plan.remove_logs.is_empty() {
        reporter.success(&format!("removed {removed} log file(s)"));
    }
    Ok(removed)
}
