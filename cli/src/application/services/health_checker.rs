//! Application service: worker health checks.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Every probe carries its own timeout and all probes run concurrently, so
//! one dead instance never delays the verdict of another.

use std::time::Duration;

use futures_util::future::join_all;

use crate::application::ports::{HealthProbe, ProcessSignaller};
use crate::domain::health::classify;
use crate::domain::{HealthReport, HealthVerdict, Instance, InstanceHealth};

/// Probe one base URL and classify the result.
pub async fn check(probe: &impl HealthProbe, base_url: &str, timeout: Duration) -> HealthVerdict {
    let verdict = match tokio::time::timeout(timeout, probe.get_health(base_url, timeout)).await {
        Ok(Ok(response)) => classify(&response),
        Ok(Err(e)) => HealthVerdict::Unreachable(format!("{e:#}")),
        Err(_) => HealthVerdict::Unreachable(format!(
            "no response within {}ms",
            timeout.as_millis()
        )),
    };
    tracing::debug!(url = base_url, verdict = verdict.label(), "health probed");
    verdict
}

/// Check every instance concurrently. Never fails for a single instance.
pub async fn check_all(
    probe: &impl HealthProbe,
    signaller: &impl ProcessSignaller,
    instances: &[Instance],
    timeout: Duration,
) -> HealthReport {
    let checks = instances.iter().map(|inst| async move {
        let url = inst.url();
        let verdict = check(probe, &url, timeout).await;
        InstanceHealth {
            id: inst.id.clone(),
            port: inst.port,
            url,
            alive: signaller.is_alive(inst.pid),
            verdict,
        }
    });
    HealthReport::new(join_all(checks).await)
}
