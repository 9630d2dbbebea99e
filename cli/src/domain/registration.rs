//! Registration outcomes and registrar-output parsing.

use std::fmt;

use rand::RngCore as _;
use serde::{Deserialize, Serialize};

use crate::domain::error::FleetError;

/// Maximum characters of registrar diagnostics kept for display.
pub const MAX_ERROR_DETAIL: usize = 400;

/// Result of one registrar call for one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResult {
    pub instance_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RegistrationResult {
    #[must_use]
    pub fn succeeded(instance_id: &str, tx_id: Option<String>) -> Self {
        Self {
            instance_id: instance_id.to_string(),
            success: true,
            tx_id,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(instance_id: &str, detail: &str) -> Self {
        Self {
            instance_id: instance_id.to_string(),
            success: false,
            tx_id: None,
            error: Some(truncate_detail(detail, MAX_ERROR_DETAIL)),
        }
    }

    /// The typed failure for this result, `None` when registration succeeded.
    #[must_use]
    pub fn failure(&self) -> Option<FleetError> {
        if self.success {
            return None;
        }
        Some(FleetError::RegistrationFailed {
            id: self.instance_id.clone(),
            detail: self.error.clone().unwrap_or_default(),
        })
    }

    /// The persisted part of the result, without the owning id.
    #[must_use]
    pub fn outcome(&self) -> RegistrationOutcome {
        RegistrationOutcome {
            success: self.success,
            tx_hash: self.tx_id.clone(),
            error: self.error.clone(),
        }
    }
}

/// Registration facts stored on instance records and manifest snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A hex-encoded private key handed to a worker and its registrar call.
///
/// `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    /// Generate a fresh random 32-byte key, `0x`-prefixed lowercase hex.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(format!("0x{}", hex_encode(&bytes)))
    }

    #[must_use]
    pub fn from_string(value: String) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(***)")
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
            let _ = write!(s, "{b:02x}");
            s
        })
}

/// Truncate `detail` to at most `max` characters, trimming whitespace.
#[must_use]
pub fn truncate_detail(detail: &str, max: usize) -> String {
    let trimmed = detail.trim();
    match trimmed.char_indices().nth(max) {
        Some((cut, _)) => trimmed[..cut].to_string(),
        None => trimmed.to_string(),
    }
}

/// Extract the transaction id from registrar stdout.
///
/// Returns `None` when stdout is not a JSON object with a string `txHash`;
/// the caller treats that as success without a transaction id.
#[must_use]
pub fn parse_registrar_output(stdout: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(stdout.trim()).ok()?;
    value
        .get("txHash")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}
