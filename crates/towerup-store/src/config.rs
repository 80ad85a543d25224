use crate::{BucketStore, HttpBackend, LocalBackend, ObjectBackend, StoreError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Http,
    Local,
}

/// Where state artifacts for one deployment are kept.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: BackendKind,
    /// Base URL of the HTTP object store.
    #[serde(default)]
    pub url: Option<String>,
    /// Root directory of the local object store.
    #[serde(default)]
    pub path: Option<PathBuf>,
    pub bucket: String,
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl StoreConfig {
    pub fn http(url: &str, bucket: &str) -> Self {
        Self {
            backend: BackendKind::Http,
            url: Some(url.trim_end_matches('/').to_owned()),
            path: None,
            bucket: bucket.to_owned(),
            auth_token: None,
        }
    }

    pub fn local(path: &Path, bucket: &str) -> Self {
        Self {
            backend: BackendKind::Local,
            url: None,
            path: Some(path.to_owned()),
            bucket: bucket.to_owned(),
            auth_token: None,
        }
    }

    /// Load config from `~/.config/towerup/store.json`.
    pub fn load_default() -> Result<Self, StoreError> {
        let path = default_config_path()?;
        Self::load(&path)
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| StoreError::Config(format!("invalid store config: {e}")))
    }

    /// Build the backend this config describes, scoped to its bucket.
    pub fn open(&self) -> Result<BucketStore, StoreError> {
        let backend: Box<dyn ObjectBackend> = match self.backend {
            BackendKind::Http => Box::new(HttpBackend::from_config(self)?),
            BackendKind::Local => {
                let path = self.path.as_deref().ok_or_else(|| {
                    StoreError::Config("local backend requires 'path'".to_owned())
                })?;
                Box::new(LocalBackend::new(path))
            }
        };
        if self.bucket.is_empty() {
            return Err(StoreError::Config("bucket must not be empty".to_owned()));
        }
        Ok(BucketStore::new(backend, &self.bucket))
    }
}

pub fn default_config_path() -> Result<PathBuf, StoreError> {
    let home = std::env::var("HOME").map_err(|_| StoreError::Config("HOME not set".to_owned()))?;
    Ok(PathBuf::from(home).join(".config/towerup/store.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StateStore;

    #[test]
    fn load_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(
            &path,
            r#"{"url":"https://store.example.com/v1","bucket":"concourse-ci","auth_token":"secret123"}"#,
        )
        .unwrap();

        let loaded = StoreConfig::load(&path).unwrap();
        assert_eq!(loaded.backend, BackendKind::Http);
        assert_eq!(loaded.url.as_deref(), Some("https://store.example.com/v1"));
        assert_eq!(loaded.bucket, "concourse-ci");
        assert_eq!(loaded.auth_token.as_deref(), Some("secret123"));
    }

    #[test]
    fn unknown_fields_rejected() {
        let err = serde_json::from_str::<StoreConfig>(r#"{"bucket":"b","region":"x"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn http_without_url_fails_to_open() {
        let config: StoreConfig = serde_json::from_str(r#"{"bucket":"b"}"#).unwrap();
        assert!(matches!(config.open(), Err(StoreError::Config(_))));
    }

    #[test]
    fn empty_bucket_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        assert!(StoreConfig::local(dir.path(), "").open().is_err());
    }

    #[test]
    fn local_config_opens_working_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreConfig::local(dir.path(), "ci").open().unwrap();
        assert!(store.get("state.json").unwrap().is_empty());
        store.set("state.json", b"{}").unwrap();
        assert_eq!(store.get("state.json").unwrap(), b"{}");
    }
}
