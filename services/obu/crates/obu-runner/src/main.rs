//! `obu-runner` entry point.
//!
//! Reads HTTP settings from `OBU_*` environment variables (edge servers
//! fall back to `EDGE_SERVERS`), registers the vehicle when asked, then
//! submits one random sensor reading per interval until SIGINT or SIGTERM.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use fleet_common::{
    ClientSettings, DEFAULT_HTTP_BACKOFF_SECS, DEFAULT_HTTP_RETRIES, EDGE_SERVERS_FALLBACK_ENV,
    VehicleCategory,
};
use obu_runner::{ObuClient, SensorData};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Simulated on-board unit for one vehicle.
#[derive(Debug, Parser)]
#[command(name = "obu-runner", version)]
struct Args {
    /// Vehicle private key sent with every request.
    #[arg(long)]
    private_key: String,

    /// Vehicle identifier.
    #[arg(long)]
    vehicle_id: String,

    /// 0 normal, 1 emergency, 2 RSU.
    #[arg(long, default_value_t = 0, value_parser = parse_category)]
    category: u8,

    /// Pin every request to this edge server.
    #[arg(long)]
    edge_server: Option<String>,

    /// Register the vehicle before reporting.
    #[arg(long)]
    register: bool,

    /// Seconds between sensor reports.
    #[arg(long, default_value = "8", value_parser = parse_interval)]
    interval: Duration,
}

/// `OBU_*` environment settings.
#[derive(Debug, Deserialize)]
struct EnvConfig {
    edge_servers: Option<String>,
    #[serde(default = "default_retries")]
    http_retries: u32,
    #[serde(default = "default_backoff")]
    http_backoff: f64,
}

fn default_retries() -> u32 {
    DEFAULT_HTTP_RETRIES
}

fn default_backoff() -> f64 {
    DEFAULT_HTTP_BACKOFF_SECS
}

fn parse_category(raw: &str) -> Result<u8, String> {
    let code: u8 = raw.parse().map_err(|e| format!("{e}"))?;
    VehicleCategory::try_from(code)
        .map(VehicleCategory::code)
        .map_err(|e| e.to_string())
}

fn parse_interval(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err("interval must be a positive number of seconds".to_string());
    }
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let env: EnvConfig = envy::prefixed("OBU_")
        .from_env()
        .context("invalid OBU_* environment")?;

    let servers = match &args.edge_server {
        Some(pinned) => Some(pinned.clone()),
        None => env
            .edge_servers
            .or_else(|| std::env::var(EDGE_SERVERS_FALLBACK_ENV).ok()),
    };
    let settings = ClientSettings::from_parts(servers.as_deref(), env.http_retries, env.http_backoff);
    let category = VehicleCategory::try_from(args.category)?;
    let client = ObuClient::new(settings, args.private_key, &args.vehicle_id, category)?;

    tracing::info!(
        vehicle = %args.vehicle_id,
        category = category.code(),
        interval_secs = args.interval.as_secs_f64(),
        "obu-runner starting",
    );

    let shutdown = interrupted();
    tokio::pin!(shutdown);

    if args.register {
        tokio::select! {
            () = &mut shutdown => {
                stopped(&client);
                return Ok(());
            }
            res = client.register() => tracing::info!(result = %res, "register result"),
        }
    }

    loop {
        let data = SensorData::random(&mut rand::thread_rng());
        tokio::select! {
            () = &mut shutdown => break,
            res = client.process_sensor_data(&data) => {
                tracing::info!(result = %res, "processed sensor data");
            }
        }
        tokio::select! {
            () = &mut shutdown => break,
            () = tokio::time::sleep(args.interval) => {}
        }
    }
    stopped(&client);
    Ok(())
}

fn stopped(client: &ObuClient) {
    tracing::info!(vehicle = %client.vehicle_id(), "obu-runner stopping");
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
