//! The `towerup.toml` deployment file.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use towerup_core::{DirectorCredentials, DirectorSession, DEFAULT_BOSH_PATH};
use towerup_iaas::{Environment, IaasEnvironment, IaasName, ManifestAssets, Release, ReleaseCatalog};
use towerup_store::StoreConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentConfig {
    #[serde(default)]
    pub bosh_path: Option<String>,
    /// Falls back to `~/.config/towerup/store.json` when absent.
    #[serde(default)]
    pub store: Option<StoreConfig>,
    pub director: DirectorConfig,
    pub releases: ReleasesConfig,
    pub environment: Environment,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectorConfig {
    pub ip: String,
    pub admin_password: String,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub ca_path: PathBuf,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleasesConfig {
    pub bosh: Release,
    pub bpm: Release,
    pub cpi: Release,
    pub os_conf: Release,
    pub stemcell: Release,
    /// Replaces the built-in release-versions document.
    #[serde(default)]
    pub versions_path: Option<PathBuf>,
}

fn read(path: &Path, what: &str) -> Result<String, String> {
    fs::read_to_string(path)
        .map_err(|e| format!("config error: failed to read {what} {}: {e}", path.display()))
}

impl DeploymentConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = read(path, "deployment file")?;
        toml::from_str(&content)
            .map_err(|e| format!("config error: invalid {}: {e}", path.display()))
    }

    pub fn releases(&self) -> ReleaseCatalog {
        ReleaseCatalog {
            bosh: self.releases.bosh.clone(),
            bpm: self.releases.bpm.clone(),
            cpi: self.releases.cpi.clone(),
            os_conf: self.releases.os_conf.clone(),
            stemcell: self.releases.stemcell.clone(),
        }
    }

    pub fn bosh_path(&self) -> &str {
        self.bosh_path.as_deref().unwrap_or(DEFAULT_BOSH_PATH)
    }

    pub fn store_config(&self) -> Result<StoreConfig, String> {
        match &self.store {
            Some(store) => Ok(store.clone()),
            None => StoreConfig::load_default().map_err(|e| {
                format!("config error: no [store] section and no default store config: {e}")
            }),
        }
    }

    /// The environment descriptor with manifest assets attached.
    pub fn environment(&self) -> Result<Environment, String> {
        let mut assets = ManifestAssets::builtin();
        if let Some(path) = &self.releases.versions_path {
            let document = read(path, "release versions")?;
            match self.environment.iaas() {
                IaasName::Aws => assets.aws.release_versions = document,
                IaasName::Gcp => assets.gcp.release_versions = document,
            }
        }
        Ok(self.environment.clone().with_assets(assets))
    }

    pub fn credentials(&self) -> Result<DirectorCredentials, String> {
        Ok(DirectorCredentials {
            admin_password: self.director.admin_password.clone(),
            certificate: read(&self.director.cert_path, "director certificate")?,
            private_key: read(&self.director.key_path, "director key")?,
            ca: read(&self.director.ca_path, "director CA")?,
        })
    }

    pub fn session(&self) -> Result<DirectorSession, String> {
        Ok(DirectorSession {
            ip: self.director.ip.clone(),
            admin_password: self.director.admin_password.clone(),
            ca_cert: read(&self.director.ca_path, "director CA")?,
        })
    }
}
