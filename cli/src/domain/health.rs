//! Health verdict types and pure classification functions.
//!
//! This module is free of I/O, async, and external layer imports.

use serde::Serialize;

use crate::domain::error::FleetError;

// ── Types ─────────────────────────────────────────────────────────────────────

/// Raw HTTP response from a worker's `/health` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpProbeResponse {
    pub status: u16,
    pub body: String,
}

/// Outcome of one health probe.
///
/// Callers must handle every variant; there is no boolean shortcut besides
/// [`HealthVerdict::is_healthy`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", content = "detail", rename_all = "snake_case")]
pub enum HealthVerdict {
    /// 2xx response whose body parsed as JSON.
    Healthy(serde_json::Value),
    /// Connection failure, timeout, or non-2xx status.
    Unreachable(String),
    /// 2xx response with a body that is not JSON.
    Error(String),
}

impl HealthVerdict {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy(_))
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Healthy(_) => "healthy",
            Self::Unreachable(_) => "unreachable",
            Self::Error(_) => "error",
        }
    }

    /// The typed failure for this verdict, `None` when healthy.
    #[must_use]
    pub fn failure(&self, id: &str) -> Option<FleetError> {
        match self {
            Self::Healthy(_) => None,
            Self::Unreachable(cause) => Some(FleetError::HealthUnreachable {
                id: id.to_string(),
                cause: cause.clone(),
            }),
            Self::Error(cause) => Some(FleetError::HealthMalformed {
                id: id.to_string(),
                cause: cause.clone(),
            }),
        }
    }
}

/// Verdict for one managed instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceHealth {
    pub id: String,
    pub port: u16,
    pub url: String,
    /// Whether the recorded pid is still alive.
    pub alive: bool,
    #[serde(flatten)]
    pub verdict: HealthVerdict,
}

/// Counts over a batch of verdicts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealthSummary {
    pub healthy: usize,
    pub unreachable: usize,
    pub error: usize,
}

impl HealthSummary {
    #[must_use]
    pub fn from_verdicts<'a>(verdicts: impl IntoIterator<Item = &'a HealthVerdict>) -> Self {
        verdicts
            .into_iter()
            .fold(Self::default(), |mut acc, v| {
                match v {
                    HealthVerdict::Healthy(_) => acc.healthy += 1,
                    HealthVerdict::Unreachable(_) => acc.unreachable += 1,
                    HealthVerdict::Error(_) => acc.error += 1,
                }
                acc
            })
    }

    #[must_use]
    pub fn unhealthy(&self) -> usize {
        self.unreachable + self.error
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.healthy + self.unhealthy()
    }
}

/// Full result of `check_all`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub instances: Vec<InstanceHealth>,
    pub summary: HealthSummary,
}

impl HealthReport {
    #[must_use]
    pub fn new(instances: Vec<InstanceHealth>) -> Self {
        let summary = HealthSummary::from_verdicts(instances.iter().map(|i| &i.verdict));
        Self { instances, summary }
    }

    #[must_use]
    pub fn all_healthy(&self) -> bool {
        self.summary.unhealthy() == 0
    }
}

// ── Classification ────────────────────────────────────────────────────────────

/// Classify a completed HTTP exchange.
#[must_use]
pub fn classify(response: &HttpProbeResponse) -> HealthVerdict {
    if !(200..300).contains(&response.status) {
        return HealthVerdict::Unreachable(format!("HTTP {}", response.status));
    }
    match serde_json::from_str::<serde_json::Value>(&response.body) {
        Ok(payload) => HealthVerdict::Healthy(payload),
        Err(e) => HealthVerdict::Error(format!("invalid JSON body: {e}")),
    }
}
