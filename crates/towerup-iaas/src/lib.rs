//! IAAS environment descriptors for towerup.
//!
//! Each supported IAAS has a descriptor struct (`AwsEnvironment`,
//! `GcpEnvironment`) holding the identifiers produced by infrastructure
//! provisioning plus the manifest assets used to render the director. All
//! descriptors implement [`IaasEnvironment`]; [`Environment`] is the closed
//! set of them, selected by the `iaas` tag in configuration.

pub mod assets;
pub mod aws;
pub mod gcp;
pub mod release;
pub mod worker;

pub use assets::{IaasAssets, ManifestAssets};
pub use aws::AwsEnvironment;
pub use gcp::GcpEnvironment;
pub use release::{stemcell_version, Release, ReleaseCatalog};
pub use worker::{AwsWorkerType, GcpWorkerType};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read credentials from {path}: {source}")]
    Credentials {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported {iaas} worker type '{worker_type}' (supported: {supported})")]
    UnsupportedWorkerType {
        iaas: IaasName,
        worker_type: String,
        supported: String,
    },
    #[error("did not find a stemcell version for alias '{alias}' in the release versions document")]
    StemcellNotFound { alias: String },
    #[error("invalid release versions document: {0}")]
    InvalidVersions(#[from] serde_json::Error),
    #[error("template error: {0}")]
    Template(#[from] towerup_template::TemplateError),
}

/// The backend a descriptor targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IaasName {
    Aws,
    Gcp,
}

impl IaasName {
    pub fn as_str(self) -> &'static str {
        match self {
            IaasName::Aws => "aws",
            IaasName::Gcp => "gcp",
        }
    }
}

impl fmt::Display for IaasName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendering capabilities every IAAS descriptor provides.
pub trait IaasEnvironment {
    /// Render the director manifest with the CPI and IAAS-specific ops
    /// applied. Placeholders for director credentials and release pins are
    /// left for the orchestrator to fill.
    fn configure_director_manifest_cpi(&self) -> Result<String, ConfigError>;

    /// Render the director cloud-config.
    fn configure_director_cloud_config(&self) -> Result<String, ConfigError>;

    /// Resolve the light stemcell URL Concourse is deployed on.
    fn configure_concourse_stemcell(&self) -> Result<String, ConfigError>;

    fn iaas(&self) -> IaasName;
}

/// Closed set of supported descriptors.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "iaas", rename_all = "lowercase")]
pub enum Environment {
    Aws(AwsEnvironment),
    Gcp(GcpEnvironment),
}

impl Environment {
    /// Replace the manifest assets of whichever descriptor this is.
    #[must_use]
    pub fn with_assets(self, assets: ManifestAssets) -> Self {
        match self {
            Environment::Aws(env) => Environment::Aws(AwsEnvironment { assets, ..env }),
            Environment::Gcp(env) => Environment::Gcp(GcpEnvironment { assets, ..env }),
        }
    }

    fn inner(&self) -> &dyn IaasEnvironment {
        match self {
            Environment::Aws(env) => env,
            Environment::Gcp(env) => env,
        }
    }
}

impl IaasEnvironment for Environment {
    fn configure_director_manifest_cpi(&self) -> Result<String, ConfigError> {
        self.inner().configure_director_manifest_cpi()
    }

    fn configure_director_cloud_config(&self) -> Result<String, ConfigError> {
        self.inner().configure_director_cloud_config()
    }

    fn configure_concourse_stemcell(&self) -> Result<String, ConfigError> {
        self.inner().configure_concourse_stemcell()
    }

    fn iaas(&self) -> IaasName {
        self.inner().iaas()
    }
}

pub(crate) fn read_credentials(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Credentials {
        path: path.to_owned(),
        source,
    })
}
