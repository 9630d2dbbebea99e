//! Application service: reading worker log files.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::application::ports::LocalFs;

/// Default number of characters shown per log file.
pub const DEFAULT_LOG_CHARS: usize = 2000;

/// One log file and the leading part of its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogExcerpt {
    pub path: PathBuf,
    pub text: String,
    pub truncated: bool,
}

/// Logs of instance `id`: every `rsu_<id>_<port>.log` in `logs_dir`.
///
/// Files from earlier runs on other ports are included; each is cut to
/// `max_chars` characters.
///
/// # Errors
///
/// Returns an error when the logs directory cannot be listed. Unreadable
/// files yield an excerpt describing the failure.
pub fn instance_logs(
    fs: &impl LocalFs,
    logs_dir: &Path,
    id: &str,
    max_chars: usize,
) -> Result<Vec<LogExcerpt>> {
    let prefix = format!("rsu_{id}_");
    let files = fs.list_files(logs_dir)?.into_iter().filter(|p| {
        p.file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(&prefix))
            .and_then(|rest| rest.strip_suffix(".log"))
            .is_some_and(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
    });
    Ok(files
        .map(|path| match fs.read_optional(&path) {
            Ok(Some(content)) => {
                let truncated = content.chars().count() > max_chars;
                let text = content.chars().take(max_chars).collect();
                LogExcerpt { path, text, truncated }
            }
            Ok(None) => LogExcerpt {
                path,
                text: String::new(),
                truncated: false,
            },
            Err(e) => LogExcerpt {
                text: format!("(unable to read log file: {e:#})"),
                path,
                truncated: false,
            },
        })
        .collect())
}
