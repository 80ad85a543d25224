pub mod cloud_config;
pub mod completions;
pub mod deploy;
pub mod destroy;
pub mod locks;
pub mod recreate;
pub mod run;
pub mod stemcell;

use crate::config::DeploymentConfig;
use std::path::Path;
use towerup_core::{CoreError, Engine};
use towerup_iaas::Environment;
use towerup_runner::ProcessRunner;
use towerup_store::BucketStore;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_STORE_ERROR: u8 = 3;

/// Everything a subcommand needs, loaded from one deployment file.
pub struct Deployment {
    pub config: DeploymentConfig,
    pub environment: Environment,
    pub engine: Engine,
}

impl Deployment {
    pub fn load(path: &Path) -> Result<Self, String> {
        let config = DeploymentConfig::load(path)?;
        let environment = config.environment()?;
        let engine = Engine::new(Box::new(ProcessRunner::new()), config.releases())
            .with_bosh_path(config.bosh_path());
        Ok(Self {
            config,
            environment,
            engine,
        })
    }

    pub fn open_store(&self) -> Result<BucketStore, String> {
        self.config
            .store_config()?
            .open()
            .map_err(|e| format!("store error: {e}"))
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn core_err(e: CoreError) -> String {
    e.to_string()
}
