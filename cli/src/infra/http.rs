//! HTTP infrastructure: implements `HealthProbe` and `StatsClient` with reqwest.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use crate::application::ports::{HealthProbe, StatsClient};
use crate::domain::HttpProbeResponse;

/// Timeout for `/api/stats` requests.
pub const STATS_TIMEOUT: Duration = Duration::from_secs(5);

/// Production HTTP client for talking to edge-server workers.
#[derive(Debug, Clone)]
pub struct WorkerHttpClient {
    client: Client,
}

impl WorkerHttpClient {
    /// Build a client; per-request timeouts are applied at call sites.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(2))
            .build()
            .context("cannot build HTTP client")?;
        Ok(Self { client })
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

impl HealthProbe for WorkerHttpClient {
    async fn get_health(&self, base_url: &str, timeout: Duration) -> Result<HttpProbeResponse> {
        let url = endpoint(base_url, "/health");
        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("reading body of {url}"))?;
        Ok(HttpProbeResponse { status, body })
    }
}

impl StatsClient for WorkerHttpClient {
    async fn fetch_stats(&self, base_url: &str) -> Result<serde_json::Value> {
        let url = endpoint(base_url, "/api/stats");
        let response = self
            .client
            .get(&url)
            .timeout(STATS_TIMEOUT)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        if !response.status().is_success() {
            anyhow::bail!("GET {url} returned {}", response.status());
        }
        response
            .json()
            .await
            .with_context(|| format!("{url} did not return JSON"))
    }
}
