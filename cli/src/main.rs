//! rsufleet - lifecycle manager for RSU edge-server and OBU client fleets

use std::process::ExitCode;

use clap::Parser;
use rsu_fleet_cli::cli::Cli;
use rsu_fleet_cli::output::json::error_document;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json = cli.json;

    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            report_error(&e, json);
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report_error(e: &anyhow::Error, json: bool) {
    if json {
        match serde_json::to_string_pretty(&error_document(e)) {
            Ok(text) => println!("{text}"),
            Err(_) => eprintln!("Error: {e:#}"),
        }
    } else {
        eprintln!("Error: {e:#}");
    }
}
