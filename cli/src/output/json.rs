//! JSON output: result documents and the error object printed by every
//! `--json` invocation that fails.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::FleetError;

/// Code reported when no `FleetError` is in the cause chain.
pub const GENERIC_ERROR_CODE: &str = "ERROR";

/// The error object for a failed command:
///
/// ```json
/// { "error": true, "message": "Instance 9 not found", "code": "PROCESS_NOT_FOUND" }
/// ```
///
/// `code` comes from the first [`FleetError`] in the cause chain.
#[must_use]
pub fn error_document(err: &anyhow::Error) -> serde_json::Value {
    let code = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<FleetError>())
        .map_or(GENERIC_ERROR_CODE, FleetError::code);
    serde_json::json!({
        "error": true,
        "message": format!("{err:#}"),
        "code": code,
    })
}

/// Renders command results as pretty-printed JSON.
pub struct JsonRenderer;

impl JsonRenderer {
    /// Print `value` as one pretty JSON document on stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<()> {
        let out = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
        println!("{out}");
        Ok(())
    }
}
