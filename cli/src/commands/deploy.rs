//! `rsufleet deploy`: launch, register and record a batch of edge servers.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::fleet::DeployOptions;
use crate::application::services::preflight::run_preflight;
use crate::domain::{DeployRequest, SecretKey};

/// Arguments for the deploy command.
#[derive(Args)]
pub struct DeployArgs {
    /// Number of edge servers to deploy (1-100)
    #[arg(long, short = 'n')]
    pub count: u16,

    /// Port of the first instance (1024-65000); the rest follow sequentially
    #[arg(long, short = 'p')]
    pub start_port: u16,

    /// Admin key handed to the registrar
    #[arg(long, env = "ADMIN_PRIVATE_KEY", hide_env_values = true)]
    pub admin_key: Option<String>,

    /// Funding sent with each registration (overrides registrar.fund_amount)
    #[arg(long, env = "FUND_AMOUNT")]
    pub fund_amount: Option<String>,

    /// Concurrent launches (overrides deploy.parallelism)
    #[arg(long, short = 'j')]
    pub parallelism: Option<usize>,

    /// Skip the runtime probe and dependency install
    #[arg(long)]
    pub skip_preflight: bool,
}

/// Run `rsufleet deploy`.
///
/// Exit code 0 when at least one instance was deployed, 1 otherwise.
///
/// # Errors
///
/// Returns an error for an invalid request, a failed dependency install,
/// a persistence failure, or an operator interrupt.
pub async fn run(app: &AppContext, args: DeployArgs) -> Result<ExitCode> {
    let reporter = app.reporter();
    let request = DeployRequest {
        count: args.count,
        start_port: args.start_port,
    };
    request.validate()?;

    if !args.skip_preflight {
        run_preflight(&app.runner, &app.fs, &app.config.worker, &reporter).await?;
    }

    let opts = DeployOptions {
        request,
        admin_key: args
            .admin_key
            .filter(|k| !k.trim().is_empty())
            .map(SecretKey::from_string),
        fund_amount: args
            .fund_amount
            .or_else(|| app.config.registrar.fund_amount.clone()),
    };
    let fleet = app.fleet_with(args.parallelism.unwrap_or(app.config.deploy.parallelism));
    let report = fleet.deploy_until(&opts, &reporter, interrupted()).await?;

    app.renderer().render_deploy(&report)?;
    if report.any_deployed() {
        Ok(ExitCode::SUCCESS)
    } else {
        if !app.is_json() {
            app.output.error("No instance was deployed.");
        }
        Ok(ExitCode::FAILURE)
    }
}

/// Completes on SIGINT or SIGTERM. Never completes when no handler can be
/// installed.
async fn interrupted() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                tracing::warn!(error = %e, "cannot watch SIGTERM");
                return ctrl_c().await;
            }
        };
        tokio::select! {
            () = ctrl_c() => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot watch Ctrl-C");
        std::future::pending::<()>().await;
    }
}
