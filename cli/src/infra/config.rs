//! Infrastructure implementation of the `ConfigStore` port.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::ConfigStore;
use crate::domain::config::FleetConfig;
use crate::infra::state::StateLayout;

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "RSU_FLEET_CONFIG";
/// Overrides `worker.dir`.
pub const WORKER_DIR_ENV: &str = "RSU_FLEET_WORKER_DIR";

/// Production implementation of `ConfigStore` that reads a YAML file on disk.
#[derive(Debug, Clone)]
pub struct YamlConfigStore {
    path: PathBuf,
}

impl YamlConfigStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `$RSU_FLEET_CONFIG` when set, otherwise `config.yaml` in the state dir.
    #[must_use]
    pub fn for_layout(layout: &StateLayout) -> Self {
        match std::env::var(CONFIG_ENV) {
            Ok(val) if !val.trim().is_empty() => Self::new(PathBuf::from(val)),
            _ => Self::new(layout.config_file()),
        }
    }
}

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<FleetConfig> {
        let mut config = if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)
                .with_context(|| format!("cannot read {}", self.path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("cannot parse {}", self.path.display()))?
        } else {
            FleetConfig::default()
        };
        if let Ok(dir) = std::env::var(WORKER_DIR_ENV)
            && !dir.trim().is_empty()
        {
            config.worker.dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }
}
