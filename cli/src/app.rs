//! Application context: unified state passed to every command handler.
//!
//! `AppContext` wires the production adapters once per invocation. Command
//! handlers borrow it and build services from its fields; adding a
//! cross-cutting concern means one field change here and zero command
//! signature changes.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::ports::{ConfigStore, LocalFs as _};
use crate::application::services::fleet::{FleetController, FleetOptions};
use crate::application::services::registration::RegistrationPipeline;
use crate::application::services::worker_launcher::EdgeWorkerLauncher;
use crate::domain::FleetConfig;
use crate::domain::env::{EnvMap, parse_env_file};
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::fs::StdFs;
use crate::infra::http::WorkerHttpClient;
use crate::infra::network::LoopbackPortProbe;
use crate::infra::process::{NixSignaller, TokioProcessSpawner};
use crate::infra::registrar::CommandRegistrar;
use crate::infra::state::{FileRegistry, StateLayout};
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer, TerminalReporter};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// State directory override (`--state-dir` / `RSU_FLEET_STATE_DIR`).
    pub state_dir: Option<PathBuf>,
}

/// Production worker launcher.
pub type ProdLauncher = EdgeWorkerLauncher<TokioProcessSpawner, LoopbackPortProbe, StdFs>;
/// Production registration stage.
pub type ProdRegistration = RegistrationPipeline<CommandRegistrar<TokioCommandRunner>>;
/// Fleet controller over the production adapters.
pub type ProdFleet<'a> = FleetController<
    'a,
    FileRegistry,
    FileRegistry,
    ProdLauncher,
    LoopbackPortProbe,
    ProdRegistration,
    NixSignaller,
>;

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    pub layout: StateLayout,
    pub config_store: YamlConfigStore,
    /// Effective configuration, loaded once.
    pub config: FleetConfig,
    /// Instance records, manifest and OBU pid map.
    pub registry: FileRegistry,
    pub signaller: NixSignaller,
    pub ports: LoopbackPortProbe,
    pub http: WorkerHttpClient,
    pub runner: TokioCommandRunner,
    pub fs: StdFs,
    pub launcher: ProdLauncher,
    pub registration: ProdRegistration,
    /// The manager's own environment; workers start from it.
    pub inherited: EnvMap,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory cannot be resolved, the
    /// configuration file cannot be parsed, or the HTTP client cannot be
    /// built.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        // JSON documents own stdout; progress lines would corrupt them.
        let quiet = flags.output.quiet || flags.output.json;

        let layout = StateLayout::resolve(flags.state_dir.clone())?;
        let config_store = YamlConfigStore::for_layout(&layout);
        let config = config_store.load()?;
        let inherited = inherited_env();
        let defaults = worker_defaults(&config);

        let launcher = EdgeWorkerLauncher::new(
            TokioProcessSpawner,
            LoopbackPortProbe,
            StdFs,
            config.worker.clone(),
            layout.logs_dir(),
            inherited.clone(),
        );
        let registration = RegistrationPipeline::new(CommandRegistrar::new(
            TokioCommandRunner,
            config.registrar.clone(),
            config.worker.dir.clone(),
            defaults,
            &inherited,
        ));

        Ok(Self {
            output: OutputContext::new(flags.output.no_color, quiet),
            mode,
            registry: FileRegistry::new(layout.clone()),
            layout,
            config_store,
            config,
            signaller: NixSignaller,
            ports: LoopbackPortProbe,
            http: WorkerHttpClient::new()?,
            runner: TokioCommandRunner,
            fs: StdFs,
            launcher,
            registration,
            inherited,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }

    /// Fleet controller with the configured launch parallelism.
    #[must_use]
    pub fn fleet(&self) -> ProdFleet<'_> {
        self.fleet_with(self.config.deploy.parallelism)
    }

    #[must_use]
    pub fn fleet_with(&self, parallelism: usize) -> ProdFleet<'_> {
        FleetController {
            registry: &self.registry,
            manifests: &self.registry,
            launcher: &self.launcher,
            ports: &self.ports,
            registration: &self.registration,
            signaller: &self.signaller,
            options: FleetOptions {
                parallelism,
                logs_dir: self.layout.logs_dir(),
            },
        }
    }
}

/// The process environment, skipping entries that are not valid UTF-8.
fn inherited_env() -> EnvMap {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

fn worker_defaults(config: &FleetConfig) -> EnvMap {
    let path = config.worker.env_file_path();
    match StdFs.read_optional(&path) {
        Ok(content) => content.as_deref().map(parse_env_file).unwrap_or_default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable defaults file");
            EnvMap::new()
        }
    }
}
