//! Deployment manifest: the durable snapshot of the deployed fleet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::instance::Instance;
use crate::domain::registration::RegistrationOutcome;

/// One instance as captured in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    pub id: String,
    pub port: u16,
    pub pid: u32,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<RegistrationOutcome>,
}

impl From<&Instance> for InstanceSnapshot {
    fn from(inst: &Instance) -> Self {
        Self {
            id: inst.id.clone(),
            port: inst.port,
            pid: inst.pid,
            url: inst.url(),
            registration: inst.registration.clone(),
        }
    }
}

/// Versioned manifest value, rewritten wholesale on every deploy and stop-all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentManifest {
    /// Incremented on every rewrite.
    #[serde(default)]
    pub generation: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub instances: Vec<InstanceSnapshot>,
}

impl DeploymentManifest {
    /// First manifest for a fresh state directory.
    #[must_use]
    pub fn initial(instances: Vec<InstanceSnapshot>) -> Self {
        Self {
            generation: 1,
            timestamp: Utc::now(),
            instances,
        }
    }

    /// Successor manifest of `previous` (if any) holding `instances`.
    #[must_use]
    pub fn succeed(previous: Option<&Self>, instances: Vec<InstanceSnapshot>) -> Self {
        match previous {
            Some(prev) => Self {
                generation: prev.generation.saturating_add(1),
                timestamp: Utc::now(),
                instances,
            },
            None => Self::initial(instances),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Base URLs of every captured instance, in manifest order.
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.instances.iter().map(|i| i.url.clone()).collect()
    }
}
