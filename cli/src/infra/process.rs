//! Infrastructure implementations of `ProcessSpawner` and `ProcessSignaller`.
//!
//! Workers are spawned into their own process group (pgid = pid) with no
//! kill-on-drop, so they outlive the manager and a later stop can signal
//! the whole subtree a worker forks.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::process::Stdio;

use anyhow::Result;

use crate::application::ports::{ProcessSignaller, ProcessSpawner, ProcessSpec, SignalOutcome};
use crate::domain::LaunchError;

// ── Spawner ───────────────────────────────────────────────────────────────────

/// Production spawner backed by `tokio::process`.
pub struct TokioProcessSpawner;

impl ProcessSpawner for TokioProcessSpawner {
    async fn spawn_detached(&self, spec: &ProcessSpec) -> Result<u32, LaunchError> {
        let log_err = |e: std::io::Error| LaunchError::LogSink {
            path: spec.log_file.clone(),
            reason: e.to_string(),
        };
        if let Some(parent) = spec.log_file.parent() {
            std::fs::create_dir_all(parent).map_err(log_err)?;
        }
        let stdout = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&spec.log_file)
            .map_err(log_err)?;
        let stderr = stdout.try_clone().map_err(log_err)?;

        // Otherwise a missing cwd surfaces as NotFound and looks like a missing executable.
        if !spec.cwd.is_dir() {
            return Err(LaunchError::Spawn(format!(
                "working directory {} does not exist",
                spec.cwd.display()
            )));
        }

        let mut cmd = tokio::process::Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(&spec.cwd)
            .env_clear()
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(false);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => LaunchError::ExecutableNotFound {
                program: spec.program.clone(),
            },
            _ => LaunchError::Spawn(e.to_string()),
        })?;
        let pid = child
            .id()
            .ok_or_else(|| LaunchError::Spawn("child exited before its pid was read".to_string()))?;
        let guard = SpawnGuard(Some(pid));

        tokio::time::sleep(spec.startup_grace).await;
        match child.try_wait() {
            Ok(None) => Ok(guard.disarm()),
            Ok(Some(status)) => Err(LaunchError::ExitedEarly {
                status: status.to_string(),
                log_file: spec.log_file.clone(),
            }),
            Err(e) => Err(LaunchError::Spawn(format!("cannot poll child {pid}: {e}"))),
        }
    }
}

/// Terminates a freshly spawned group when dropped while still armed.
///
/// A launch future dropped during the startup grace (operator interrupt)
/// would otherwise leave a detached worker nobody has recorded.
struct SpawnGuard(Option<u32>);

impl SpawnGuard {
    fn disarm(mut self) -> u32 {
        self.0.take().unwrap_or_default()
    }
}

impl Drop for SpawnGuard {
    fn drop(&mut self) {
        let Some(pid) = self.0.take() else {
            return;
        };
        match NixSignaller.terminate_group(pid) {
            Ok(outcome) => tracing::info!(pid, ?outcome, "abandoned launch terminated"),
            Err(e) => tracing::warn!(pid, error = %e, "cannot terminate abandoned launch"),
        }
    }
}

// ── Signaller ─────────────────────────────────────────────────────────────────

/// Liveness probe and group termination through `nix`.
pub struct NixSignaller;

#[cfg(unix)]
impl ProcessSignaller for NixSignaller {
    fn is_alive(&self, pid: u32) -> bool {
        use nix::errno::Errno;
        use nix::sys::signal::kill;

        let Some(pid) = to_pid(pid) else {
            return false;
        };
        // EPERM: the process exists but belongs to someone else.
        matches!(kill(pid, None), Ok(()) | Err(Errno::EPERM))
    }

    fn terminate_group(&self, pid: u32) -> Result<SignalOutcome> {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, kill, killpg};

        let target = to_pid(pid).ok_or_else(|| anyhow::anyhow!("refusing to signal pid {pid}"))?;
        match killpg(target, Signal::SIGTERM) {
            Ok(()) => {
                tracing::info!(pid, "SIGTERM sent to process group");
                Ok(SignalOutcome::Delivered)
            }
            // No such group: the worker may have left it, so try the leader itself.
            Err(Errno::ESRCH) => match kill(target, Signal::SIGTERM) {
                Ok(()) => {
                    tracing::info!(pid, "SIGTERM sent to process");
                    Ok(SignalOutcome::Delivered)
                }
                Err(Errno::ESRCH) => {
                    tracing::info!(pid, "process already gone");
                    Ok(SignalOutcome::NoSuchProcess)
                }
                Err(e) => Err(anyhow::anyhow!("cannot signal pid {pid}: {e}")),
            },
            Err(e) => Err(anyhow::anyhow!("cannot signal process group {pid}: {e}")),
        }
    }
}

#[cfg(not(unix))]
impl ProcessSignaller for NixSignaller {
    fn is_alive(&self, _pid: u32) -> bool {
        false
    }

    fn terminate_group(&self, pid: u32) -> Result<SignalOutcome> {
        anyhow::bail!("process-group signals are not supported on this platform (pid {pid})")
    }
}

/// Pids 0 and 1 would address our own group or init; never signal them.
#[cfg(unix)]
fn to_pid(pid: u32) -> Option<nix::unistd::Pid> {
    i32::try_from(pid)
        .ok()
        .filter(|p| *p > 1)
        .map(nix::unistd::Pid::from_raw)
}
