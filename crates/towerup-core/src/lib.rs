//! Lifecycle orchestration for towerup.
//!
//! The [`Engine`] turns an IAAS environment descriptor into a running (or
//! removed) BOSH director by rendering its manifest, hydrating BOSH state
//! from a [`towerup_store::StateStore`], invoking the external `bosh` binary
//! and persisting the resulting state. It also drives the authenticated
//! follow-on operations against a running director.

pub mod engine;
pub mod lifecycle;

pub use engine::{
    DirectorCredentials, DirectorSession, Engine, DEFAULT_BOSH_PATH, DEPLOYMENT_NAME, DIRECTOR_NAME,
};
pub use lifecycle::{EnvAction, Phase};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("template error: {0}")]
    Template(#[from] towerup_template::TemplateError),
    #[error("configuration error: {0}")]
    Config(#[from] towerup_iaas::ConfigError),
    #[error("store error: {0}")]
    Store(#[from] towerup_store::StoreError),
    #[error("{0}")]
    Runner(#[from] towerup_runner::RunnerError),
    #[error("I/O error during {phase}: {source}")]
    Io {
        phase: Phase,
        #[source]
        source: std::io::Error,
    },
}

impl CoreError {
    pub(crate) fn io(phase: Phase) -> impl FnOnce(std::io::Error) -> Self {
        move |source| CoreError::Io { phase, source }
    }
}
