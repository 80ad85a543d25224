use crate::ConfigError;
use serde::{Deserialize, Serialize};

/// A pinned BOSH release: where to download it and how to verify it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Release {
    pub url: String,
    pub version: String,
    pub sha1: String,
}

/// Releases and the stemcell the director manifest is pinned to.
///
/// Each entry fills the `((<name>_url))`, `((<name>_version))` and
/// `((<name>_sha1))` placeholders of the director manifest and its ops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseCatalog {
    pub bosh: Release,
    pub bpm: Release,
    /// The CPI release of the configured IAAS.
    pub cpi: Release,
    pub os_conf: Release,
    /// The stemcell the director VM boots from.
    pub stemcell: Release,
}

impl ReleaseCatalog {
    /// Every pin with the placeholder prefix it fills.
    pub fn entries(&self) -> [(&'static str, &Release); 5] {
        [
            ("bosh", &self.bosh),
            ("bpm", &self.bpm),
            ("cpi", &self.cpi),
            ("os_conf", &self.os_conf),
            ("stemcell", &self.stemcell),
        ]
    }
}

#[derive(Deserialize)]
struct VersionEntry {
    path: String,
    #[serde(default)]
    value: serde_json::Value,
}

/// Find the stemcell version pinned for `alias` in a release-versions
/// document.
///
/// When the document pins the alias more than once the last entry wins,
/// matching how the entries would be applied as ops.
pub fn stemcell_version(document: &str, alias: &str) -> Result<String, ConfigError> {
    let entries: Vec<VersionEntry> = serde_json::from_str(document)?;
    let wanted = format!("/stemcells/alias={alias}/version");

    let version = entries
        .iter()
        .filter(|e| e.path == wanted)
        .filter_map(|e| match &e.value {
            serde_json::Value::String(s) => Some(s.trim().to_owned()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .next_back()
        .unwrap_or_default();

    if version.is_empty() {
        return Err(ConfigError::StemcellNotFound {
            alias: alias.to_owned(),
        });
    }
    Ok(version)
}
