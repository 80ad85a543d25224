/// Templates and release metadata used to render one IAAS's artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IaasAssets {
    pub cpi_ops: String,
    pub external_ip_ops: String,
    pub director_custom_ops: String,
    pub jumpbox_user_ops: String,
    pub cloud_config: String,
    /// Pinned release-version document: a JSON array of
    /// `{type, path, value}` operations.
    pub release_versions: String,
}

impl IaasAssets {
    /// Ops fragments in the order they are applied to the director manifest.
    pub fn director_ops(&self) -> [&str; 4] {
        [
            self.cpi_ops.as_str(),
            self.external_ip_ops.as_str(),
            self.director_custom_ops.as_str(),
            self.jumpbox_user_ops.as_str(),
        ]
    }
}

/// Every template a descriptor needs, passed in rather than read from
/// process-wide statics so tests can substitute their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestAssets {
    pub director_manifest: String,
    pub aws: IaasAssets,
    pub gcp: IaasAssets,
}

impl ManifestAssets {
    /// The assets compiled into the binary.
    pub fn builtin() -> Self {
        Self {
            director_manifest: include_str!("../assets/director/bosh.yml").to_owned(),
            aws: IaasAssets {
                cpi_ops: include_str!("../assets/aws/cpi.yml").to_owned(),
                external_ip_ops: include_str!("../assets/aws/external-ip.yml").to_owned(),
                director_custom_ops: include_str!("../assets/aws/director-custom.yml").to_owned(),
                jumpbox_user_ops: include_str!("../assets/aws/jumpbox-user.yml").to_owned(),
                cloud_config: include_str!("../assets/aws/cloud-config.yml").to_owned(),
                release_versions: include_str!("../assets/aws/versions.json").to_owned(),
            },
            gcp: IaasAssets {
                cpi_ops: include_str!("../assets/gcp/cpi.yml").to_owned(),
                external_ip_ops: include_str!("../assets/gcp/external-ip.yml").to_owned(),
                director_custom_ops: include_str!("../assets/gcp/director-custom.yml").to_owned(),
                jumpbox_user_ops: include_str!("../assets/gcp/jumpbox-user.yml").to_owned(),
                cloud_config: include_str!("../assets/gcp/cloud-config.yml").to_owned(),
                release_versions: include_str!("../assets/gcp/versions.json").to_owned(),
            },
        }
    }
}

impl Default for ManifestAssets {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use towerup_template::parse_ops;

    #[test]
    fn builtin_ops_fragments_parse() {
        let assets = ManifestAssets::builtin();
        for iaas in [&assets.aws, &assets.gcp] {
            for fragment in iaas.director_ops() {
                assert!(!parse_ops(fragment).unwrap().is_empty());
            }
        }
    }

    #[test]
    fn builtin_director_manifest_is_yaml() {
        let doc: serde_yaml::Value =
            serde_yaml::from_str(&ManifestAssets::builtin().director_manifest).unwrap();
        assert!(doc.get("instance_groups").is_some());
    }
}
