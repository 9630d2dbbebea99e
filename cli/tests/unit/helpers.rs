//! Fixture builders shared across unit test files.

#![allow(dead_code)]

use std::path::PathBuf;

use rsu_fleet_cli::application::services::fleet::{DeployOptions, FleetController, FleetOptions};
use rsu_fleet_cli::domain::{DeployRequest, DeploymentManifest, Instance, InstanceSnapshot, SecretKey};

use crate::fakes::{
    BusyPorts, FakeLauncher, FakeRegistration, FakeSignaller, MemoryStore, RegistrarMode,
};

pub const LOGS_DIR: &str = "/var/tmp/rsu-fleet-test/logs";

/// Every collaborator of a [`FleetController`], owned in one place.
pub struct Fleet {
    pub store: MemoryStore,
    pub launcher: FakeLauncher,
    pub ports: BusyPorts,
    pub registration: FakeRegistration,
    pub signaller: FakeSignaller,
}

pub type TestController<'a> = FleetController<
    'a,
    MemoryStore,
    MemoryStore,
    FakeLauncher,
    BusyPorts,
    FakeRegistration,
    FakeSignaller,
>;

impl Fleet {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::default(),
            launcher: FakeLauncher::new(),
            ports: BusyPorts::none(),
            registration: FakeRegistration::new(RegistrarMode::Succeed),
            signaller: FakeSignaller::default(),
        }
    }

    pub fn controller(&self) -> TestController<'_> {
        FleetController {
            registry: &self.store,
            manifests: &self.store,
            launcher: &self.launcher,
            ports: &self.ports,
            registration: &self.registration,
            signaller: &self.signaller,
            options: FleetOptions {
                parallelism: 4,
                logs_dir: PathBuf::from(LOGS_DIR),
            },
        }
    }
}

pub fn deploy_opts(count: u16, start_port: u16) -> DeployOptions {
    DeployOptions {
        request: DeployRequest { count, start_port },
        admin_key: Some(SecretKey::from_string("0xadmin".to_string())),
        fund_amount: None,
    }
}

pub fn instance(id: &str, port: u16, pid: u32) -> Instance {
    Instance::new(id, port, pid)
}

pub fn manifest_with(generation: u64, instances: &[Instance]) -> DeploymentManifest {
    let mut manifest =
        DeploymentManifest::initial(instances.iter().map(InstanceSnapshot::from).collect());
    manifest.generation = generation;
    manifest
}

/// The `FleetError` code carried by an `anyhow` chain, if any.
pub fn error_code(err: &anyhow::Error) -> Option<&'static str> {
    err.chain()
        .find_map(|e| e.downcast_ref::<rsu_fleet_cli::domain::FleetError>())
        .map(rsu_fleet_cli::domain::FleetError::code)
}
