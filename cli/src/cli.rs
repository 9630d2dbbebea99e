//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser, Subcommand};

use crate::app::{AppContext, AppFlags, OutputFlags};
use crate::commands;
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer};

/// Lifecycle manager for RSU edge-server and OBU client fleets
#[derive(Parser)]
#[command(
    name = "rsufleet",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (any non-empty `NO_COLOR` also disables it)
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// State directory [default: ~/.rsu-fleet]
    #[arg(long, global = true, env = "RSU_FLEET_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Deploy a batch of edge servers and register them
    Deploy(commands::deploy::DeployArgs),

    /// Start one edge server
    Start(commands::start::StartArgs),

    /// Stop one edge server
    Stop(commands::stop::StopArgs),

    /// Stop every managed edge server
    StopAll,

    /// Show one edge server's status
    Status(commands::status::StatusArgs),

    /// List managed edge servers
    List,

    /// Show an edge server's log files
    Logs(commands::logs::LogsArgs),

    /// Check /health on every managed edge server
    Health,

    /// Show on-chain statistics of one edge server
    Stats(commands::stats::StatsArgs),

    /// Render an nginx upstream for the current deployment
    LbConfig(commands::projection::ProjectionArgs),

    /// Render a compose file for the current deployment
    DockerConfig(commands::projection::ProjectionArgs),

    /// Archive the manifest and remove logs
    Clean(commands::clean::CleanArgs),

    /// Manage simulated vehicles
    #[command(subcommand)]
    Obu(commands::obu::ObuCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the context cannot be built or the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            state_dir,
            command,
            ..
        } = self;
        if matches!(command, Command::Version) {
            let output = OutputContext::new(no_color, quiet);
            let renderer = if json {
                Renderer::Json(JsonRenderer)
            } else {
                Renderer::Human(HumanRenderer::new(&output))
            };
            return commands::version::run(&renderer);
        }

        let app = AppContext::new(&AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            state_dir,
        })?;

        match command {
            Command::Deploy(args) => commands::deploy::run(&app, args).await,
            Command::Start(args) => commands::start::run(&app, &args).await,
            Command::Stop(args) => commands::stop::run(&app, &args).await,
            Command::StopAll => commands::stop::run_all(&app).await,
            Command::Status(args) => commands::status::run(&app, &args).await,
            Command::List => commands::status::list(&app).await,
            Command::Logs(args) => commands::logs::run(&app, &args),
            Command::Health => commands::health::run(&app).await,
            Command::Stats(args) => commands::stats::run(&app, &args).await,
            Command::LbConfig(args) => commands::projection::lb_config(&app, &args).await,
            Command::DockerConfig(args) => commands::projection::docker_config(&app, &args).await,
            Command::Clean(args) => commands::clean::run(&app, &args),
            Command::Obu(cmd) => commands::obu::run(&app, cmd).await,
            Command::Config(cmd) => commands::config::run(&app, &cmd),
            Command::Version => commands::version::run(&app.renderer()),
        }
    }
}
