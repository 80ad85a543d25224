//! Remote state persistence for towerup.
//!
//! BOSH keeps the director's resource state and its generated credentials in
//! two files (`state.json` and `vars.yaml`). Losing them orphans the
//! director, so towerup keeps them in a durable object store between runs.
//!
//! Two layers are provided: [`ObjectBackend`] is the raw transport (HTTP or a
//! local directory) and reports absent objects as [`StoreError::NotFound`];
//! [`StateStore`] is what the lifecycle engine talks to, and it treats an
//! absent key as an empty artifact rather than an error.

pub mod config;
pub mod http;
pub mod local;
pub mod memory;

pub use config::{BackendKind, StoreConfig};
pub use http::HttpBackend;
pub use local::LocalBackend;
pub use memory::MemoryBackend;

use thiserror::Error;
use tracing::debug;

/// Key of the director state artifact.
pub const STATE_KEY: &str = "state.json";
/// Key of the generated-credentials artifact.
pub const VARS_KEY: &str = "vars.yaml";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid object key '{0}'")]
    InvalidKey(String),
    #[error("store config error: {0}")]
    Config(String),
}

/// Transport to a bucket-oriented object store.
pub trait ObjectBackend: Send + Sync {
    /// Upload `data` as `bucket/key`, replacing any existing object.
    fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> Result<(), StoreError>;

    /// Download `bucket/key`. An absent object is [`StoreError::NotFound`].
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;
}

/// Key/value persistence for state artifacts.
pub trait StateStore {
    /// Fetch `key`. An absent key yields empty bytes, never an error.
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Store `data` under `key`, overwriting unconditionally.
    fn set(&self, key: &str, data: &[u8]) -> Result<(), StoreError>;
}

/// A [`StateStore`] scoped to one bucket of an [`ObjectBackend`].
///
/// There is no locking or versioning: callers must not run two lifecycle
/// operations against the same bucket at once.
pub struct BucketStore {
    backend: Box<dyn ObjectBackend>,
    bucket: String,
}

impl BucketStore {
    pub fn new(backend: Box<dyn ObjectBackend>, bucket: &str) -> Self {
        Self {
            backend,
            bucket: bucket.to_owned(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

impl StateStore for BucketStore {
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        match self.backend.get_object(&self.bucket, key) {
            Ok(data) => {
                debug!(bucket = %self.bucket, key, bytes = data.len(), "fetched state artifact");
                Ok(data)
            }
            Err(StoreError::NotFound(_)) => {
                debug!(bucket = %self.bucket, key, "state artifact absent");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    fn set(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        debug!(bucket = %self.bucket, key, bytes = data.len(), "storing state artifact");
        self.backend.put_object(&self.bucket, key, data)
    }
}

/// Reject keys that could escape a bucket when mapped onto a path or URL.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let bad = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0');
    if bad {
        return Err(StoreError::InvalidKey(key.to_owned()));
    }
    Ok(())
}
