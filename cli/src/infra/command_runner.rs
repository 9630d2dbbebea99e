//! Infrastructure implementation of the `CommandRunner` port.
//!
//! Runs short-lived helper commands (the registrar script, the runtime
//! version probe, the dependency install) to completion with captured output.

use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

use crate::application::ports::{CommandRunner, Invocation};

/// Production `CommandRunner` on `tokio::process`.
///
/// A timeout kills the child explicitly; dropping the `wait` future alone
/// would leave a hung registrar running.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, invocation: &Invocation, timeout: Duration) -> Result<Output> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.cwd {
            cmd.current_dir(dir);
        }
        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn {}", invocation.program))?;
        wait_with_timeout(child, &invocation.program, timeout).await
    }
}

/// Everything `pipe` yields; read errors end the capture early.
async fn drain(pipe: Option<impl AsyncRead + Unpin>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    buf
}

async fn wait_with_timeout(mut child: Child, program: &str, timeout: Duration) -> Result<Output> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    tokio::select! {
        (status, stdout, stderr) = async {
            tokio::join!(child.wait(), drain(stdout), drain(stderr))
        } => Ok(Output {
            status: status.with_context(|| format!("waiting for {program}"))?,
            stdout,
            stderr,
        }),
        () = tokio::time::sleep(timeout) => {
            let _ = child.kill().await;
            tracing::warn!(program, timeout_ms = timeout.as_millis(), "command timed out, killed");
            anyhow::bail!("{program} timed out after {}s", timeout.as_secs_f32())
        }
    }
}
