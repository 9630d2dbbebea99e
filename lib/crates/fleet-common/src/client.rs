use std::time::Duration;

/// Primary variable holding the edge-server list for simulated clients.
pub const EDGE_SERVERS_ENV: &str = "OBU_EDGE_SERVERS";

/// Secondary variable consulted when `OBU_EDGE_SERVERS` is unset.
pub const EDGE_SERVERS_FALLBACK_ENV: &str = "EDGE_SERVERS";

/// Edge servers used when no list is configured.
pub const DEFAULT_EDGE_SERVERS: &[&str] = &["http://localhost:3000", "http://localhost:3001"];

/// Attempts per HTTP request (first try included).
pub const DEFAULT_HTTP_RETRIES: u32 = 3;

/// Base delay between HTTP attempts; attempt `n` waits `n × backoff`.
pub const DEFAULT_HTTP_BACKOFF_SECS: f64 = 0.5;

/// Parse an edge-server list.
///
/// Accepts either a JSON array of strings or a comma-separated list.
/// Blank entries are dropped and surrounding whitespace is trimmed.
#[must_use]
pub fn parse_edge_servers(raw: &str) -> Vec<String> {
    if let Ok(list) = serde_json::from_str::<Vec<String>>(raw) {
        return list
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolved client-side HTTP settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    /// Edge servers to spread requests over.
    pub edge_servers: Vec<String>,
    /// Attempts per request, always at least 1.
    pub retries: u32,
    /// Linear backoff base.
    pub backoff: Duration,
}

impl ClientSettings {
    /// Build settings from raw configuration values.
    ///
    /// A missing or empty server list falls back to [`DEFAULT_EDGE_SERVERS`].
    /// Negative or non-finite backoff values are treated as zero.
    #[must_use]
    pub fn from_parts(edge_servers: Option<&str>, retries: u32, backoff_secs: f64) -> Self {
        let mut servers = edge_servers.map(parse_edge_servers).unwrap_or_default();
        if servers.is_empty() {
            servers = DEFAULT_EDGE_SERVERS.iter().map(|s| (*s).to_string()).collect();
        }
        let backoff = if backoff_secs.is_finite() && backoff_secs > 0.0 {
            Duration::from_secs_f64(backoff_secs)
        } else {
            Duration::ZERO
        };
        Self {
            edge_servers: servers,
            retries: retries.max(1),
            backoff,
        }
    }

    /// Delay to wait after the given (1-based) failed attempt.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::from_parts(None, DEFAULT_HTTP_RETRIES, DEFAULT_HTTP_BACKOFF_SECS)
    }
}
