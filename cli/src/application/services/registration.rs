//! Application service: registration pipeline.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! One registrar call per launched instance per deploy run; the outcome is
//! always a [`RegistrationResult`], never an error.

use crate::application::ports::{Registrar, RegistrarCall, RegistrarReply, RegistrationStage};
use crate::domain::RegistrationResult;
use crate::domain::registration::parse_registrar_output;

/// Turns registrar replies into [`RegistrationResult`] values.
pub struct RegistrationPipeline<R> {
    registrar: R,
}

impl<R: Registrar> RegistrationPipeline<R> {
    pub fn new(registrar: R) -> Self {
        Self { registrar }
    }
}

impl<R: Registrar> RegistrationStage for RegistrationPipeline<R> {
    async fn register(&self, call: &RegistrarCall) -> RegistrationResult {
        if call.admin_key.is_none() {
            tracing::warn!(
                instance = %call.instance_id,
                "no admin authority configured; registration may fail"
            );
        }
        tracing::info!(
            instance = %call.instance_id,
            server_id = %call.server_id(),
            location = %call.location(),
            "registering instance"
        );
        let result = match self.registrar.submit(call).await {
            Ok(reply) => interpret(&call.instance_id, &reply),
            Err(e) => RegistrationResult::failed(&call.instance_id, &format!("{e:#}")),
        };
        match &result.error {
            None => tracing::info!(instance = %call.instance_id, tx = ?result.tx_id, "registered"),
            Some(detail) => {
                tracing::warn!(instance = %call.instance_id, error = %detail, "registration failed");
            }
        }
        result
    }
}

/// Map a registrar reply onto a result.
///
/// A successful exit without a parseable transaction id is still a success.
#[must_use]
pub fn interpret(instance_id: &str, reply: &RegistrarReply) -> RegistrationResult {
    if reply.exit_ok {
        return RegistrationResult::succeeded(instance_id, parse_registrar_output(&reply.stdout));
    }
    let detail = if reply.stderr.trim().is_empty() {
        if reply.stdout.trim().is_empty() {
            format!("registrar exited with {}", reply.status)
        } else {
            reply.stdout.clone()
        }
    } else {
        reply.stderr.clone()
    };
    RegistrationResult::failed(instance_id, &detail)
}
