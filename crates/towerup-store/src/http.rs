use crate::{validate_key, ObjectBackend, StoreConfig, StoreError};
use std::io::Read;
use tracing::debug;

/// Protocol version sent as the `X-Towerup-Protocol` header.
pub const PROTOCOL_VERSION: u32 = 1;

/// Object store reached over plain HTTP.
///
/// Expects a minimal REST API:
/// - `PUT <url>/<bucket>/<key>` stores the request body
/// - `GET <url>/<bucket>/<key>` returns it, or 404 when absent
pub struct HttpBackend {
    url: String,
    auth_token: Option<String>,
    agent: ureq::Agent,
}

impl HttpBackend {
    pub fn new(url: &str, auth_token: Option<&str>) -> Self {
        Self {
            url: url.trim_end_matches('/').to_owned(),
            auth_token: auth_token.map(str::to_owned),
            agent: ureq::Agent::new_with_defaults(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Config("http backend requires 'url'".to_owned()))?;
        Ok(Self::new(url, config.auth_token.as_deref()))
    }

    fn object_url(&self, bucket: &str, key: &str) -> Result<String, StoreError> {
        validate_key(bucket)?;
        validate_key(key)?;
        Ok(format!("{}/{bucket}/{key}", self.url))
    }

    fn do_put(&self, url: &str, data: &[u8]) -> Result<(), StoreError> {
        let mut req = self
            .agent
            .put(url)
            .header("Content-Type", "application/octet-stream")
            .header("X-Towerup-Protocol", &PROTOCOL_VERSION.to_string());
        if let Some(ref token) = self.auth_token {
            req = req.header("Authorization", &format!("Bearer {token}"));
        }
        match req.send(data) {
            Ok(_) => Ok(()),
            Err(ureq::Error::StatusCode(code)) => {
                Err(StoreError::Http(format!("HTTP {code} for PUT {url}")))
            }
            Err(e) => Err(StoreError::Http(e.to_string())),
        }
    }

    fn do_get(&self, url: &str) -> Result<Vec<u8>, StoreError> {
        let mut req = self
            .agent
            .get(url)
            .header("X-Towerup-Protocol", &PROTOCOL_VERSION.to_string());
        if let Some(ref token) = self.auth_token {
            req = req.header("Authorization", &format!("Bearer {token}"));
        }
        let resp = match req.call() {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(404)) => {
                return Err(StoreError::NotFound(url.to_owned()));
            }
            Err(ureq::Error::StatusCode(code)) => {
                return Err(StoreError::Http(format!("HTTP {code} for GET {url}")));
            }
            Err(e) => {
                return Err(StoreError::Http(e.to_string()));
            }
        };

        let mut body = Vec::new();
        resp.into_body()
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| StoreError::Http(e.to_string()))?;
        Ok(body)
    }
}

impl ObjectBackend for HttpBackend {
    fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> Result<(), StoreError> {
        let url = self.object_url(bucket, key)?;
        debug!("PUT {url} ({} bytes)", data.len());
        self.do_put(&url, data)
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let url = self.object_url(bucket, key)?;
        debug!("GET {url}");
        self.do_get(&url)
    }
}
