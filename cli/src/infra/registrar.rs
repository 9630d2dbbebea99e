//! Registrar adapter: runs the external on-chain registration script.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::ports::{CommandRunner, Invocation, Registrar, RegistrarCall, RegistrarReply};
use crate::domain::config::RegistrarConfig;
use crate::domain::env::EnvMap;

/// Environment variable carrying the admin authority to the script.
pub const ADMIN_KEY_ENV: &str = "ADMIN_PRIVATE_KEY";

/// Runs `<program> <script> --private-key .. --server-id .. --location ..`
/// in the worker directory.
pub struct CommandRegistrar<R> {
    runner: R,
    config: RegistrarConfig,
    worker_dir: PathBuf,
    /// Worker defaults-file entries the manager's own environment lacks.
    defaults: EnvMap,
}

impl<R: CommandRunner> CommandRegistrar<R> {
    /// `defaults` are filtered against `inherited` so the process
    /// environment always wins.
    #[must_use]
    pub fn new(
        runner: R,
        config: RegistrarConfig,
        worker_dir: PathBuf,
        defaults: EnvMap,
        inherited: &EnvMap,
    ) -> Self {
        let defaults = defaults
            .into_iter()
            .filter(|(key, _)| !inherited.contains_key(key))
            .collect();
        Self {
            runner,
            config,
            worker_dir,
            defaults,
        }
    }

    #[must_use]
    pub fn invocation(&self, call: &RegistrarCall) -> Invocation {
        let mut args = vec![
            self.config.script.to_string_lossy().into_owned(),
            "--private-key".to_string(),
            call.private_key.expose().to_string(),
            "--server-id".to_string(),
            call.server_id(),
            "--location".to_string(),
            call.location(),
        ];
        if let Some(amount) = &call.fund_amount {
            args.push("--fund-amount".to_string());
            args.push(amount.clone());
        }

        let mut env: Vec<(String, String)> = self
            .defaults
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(admin) = &call.admin_key {
            env.push((ADMIN_KEY_ENV.to_string(), admin.expose().to_string()));
        }

        Invocation {
            program: self.config.program.clone(),
            args,
            cwd: Some(self.worker_dir.clone()),
            env,
        }
    }
}

impl<R: CommandRunner> Registrar for CommandRegistrar<R> {
    async fn submit(&self, call: &RegistrarCall) -> Result<RegistrarReply> {
        let invocation = self.invocation(call);
        tracing::info!(
            instance = %call.instance_id,
            port = call.port,
            server_id = %call.server_id(),
            "running registrar"
        );
        let output = self.runner.run(&invocation, self.config.timeout()).await?;
        Ok(RegistrarReply {
            exit_ok: output.status.success(),
            status: output.status.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
