use crate::{
    read_credentials, release::stemcell_version, AwsWorkerType, ConfigError, IaasEnvironment,
    IaasName, ManifestAssets,
};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::PathBuf;
use towerup_template::{render, render_simple, Variables};
use tracing::debug;

const STEMCELL_ALIAS: &str = "xenial";

/// AWS deployment target.
///
/// Network and security-group identifiers come from infrastructure
/// provisioning; the private key named by `private_key_path` is read when the
/// director manifest is rendered.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AwsEnvironment {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub az: String,
    pub default_key_name: String,
    pub private_key_path: PathBuf,
    pub default_security_group: String,
    pub vm_security_group: String,
    pub atc_security_group: String,
    pub public_subnet_id: String,
    pub private_subnet_id: String,

    pub internal_cidr: String,
    pub internal_gw: String,
    pub internal_ip: String,
    pub external_ip: String,

    pub blobstore_bucket: String,
    pub s3_aws_access_key_id: String,
    pub s3_aws_secret_access_key: String,
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_username: String,
    pub db_password: String,
    pub db_ca_cert: String,

    pub spot: bool,
    pub worker_type: AwsWorkerType,
    pub public_cidr: String,
    pub public_cidr_gateway: String,
    pub public_cidr_reserved: String,
    pub public_cidr_static: String,
    pub private_cidr: String,
    pub private_cidr_gateway: String,
    pub private_cidr_reserved: String,

    /// Extra ops fragment applied after the built-in ones.
    pub custom_operations: String,

    #[serde(skip)]
    pub assets: ManifestAssets,
}

/// Fields read by the AWS cloud-config template. Every field must be
/// referenced by the template and nothing else may be.
#[derive(Debug, Clone, Serialize)]
pub struct AwsCloudConfigParams {
    pub az: String,
    pub vm_security_group: String,
    pub atc_security_group: String,
    pub public_subnet_id: String,
    pub private_subnet_id: String,
    pub spot: bool,
    pub worker_type: String,
    pub public_cidr: String,
    pub public_cidr_gateway: String,
    pub public_cidr_reserved: String,
    pub public_cidr_static: String,
    pub private_cidr: String,
    pub private_cidr_gateway: String,
    pub private_cidr_reserved: String,
}

impl AwsEnvironment {
    pub fn cloud_config_params(&self) -> AwsCloudConfigParams {
        AwsCloudConfigParams {
            az: self.az.clone(),
            vm_security_group: self.vm_security_group.clone(),
            atc_security_group: self.atc_security_group.clone(),
            public_subnet_id: self.public_subnet_id.clone(),
            private_subnet_id: self.private_subnet_id.clone(),
            spot: self.spot,
            worker_type: self.worker_type.as_str().to_owned(),
            public_cidr: self.public_cidr.clone(),
            public_cidr_gateway: self.public_cidr_gateway.clone(),
            public_cidr_reserved: self.public_cidr_reserved.clone(),
            public_cidr_static: self.public_cidr_static.clone(),
            private_cidr: self.private_cidr.clone(),
            private_cidr_gateway: self.private_cidr_gateway.clone(),
            private_cidr_reserved: self.private_cidr_reserved.clone(),
        }
    }

    fn manifest_variables(&self, private_key: String) -> Variables {
        Variables::new()
            .with("internal_cidr", self.internal_cidr.as_str())
            .with("internal_gw", self.internal_gw.as_str())
            .with("internal_ip", self.internal_ip.as_str())
            .with("external_ip", self.external_ip.as_str())
            .with("access_key_id", self.access_key_id.as_str())
            .with("secret_access_key", self.secret_access_key.as_str())
            .with("region", self.region.as_str())
            .with("az", self.az.as_str())
            .with("default_key_name", self.default_key_name.as_str())
            .with(
                "default_security_groups",
                Value::Sequence(vec![Value::from(self.default_security_group.as_str())]),
            )
            .with("subnet_id", self.public_subnet_id.as_str())
            .with("private_key", private_key)
            .with("blobstore_bucket", self.blobstore_bucket.as_str())
            .with("s3_aws_access_key_id", self.s3_aws_access_key_id.as_str())
            .with("s3_aws_secret_access_key", self.s3_aws_secret_access_key.as_str())
            .with("db_host", self.db_host.as_str())
            .with("db_port", self.db_port)
            .with("db_name", self.db_name.as_str())
            .with("db_username", self.db_username.as_str())
            .with("db_password", self.db_password.as_str())
            .with("db_ca_cert", self.db_ca_cert.as_str())
    }
}

impl IaasEnvironment for AwsEnvironment {
    fn configure_director_manifest_cpi(&self) -> Result<String, ConfigError> {
        let private_key = read_credentials(&self.private_key_path)?;
        let vars = self.manifest_variables(private_key);

        let mut ops = self.assets.aws.director_ops().to_vec();
        ops.push(self.custom_operations.as_str());
        debug!(
            iaas = "aws",
            fragments = ops.len(),
            region = %self.region,
            "rendering director manifest"
        );
        Ok(render(&self.assets.director_manifest, &ops, &vars)?)
    }

    fn configure_director_cloud_config(&self) -> Result<String, ConfigError> {
        debug!(iaas = "aws", worker_type = %self.worker_type, spot = self.spot, "rendering cloud-config");
        Ok(render_simple(
            "aws/cloud-config.yml",
            &self.assets.aws.cloud_config,
            &self.cloud_config_params(),
        )?)
    }

    fn configure_concourse_stemcell(&self) -> Result<String, ConfigError> {
        let version = stemcell_version(&self.assets.aws.release_versions, STEMCELL_ALIAS)?;
        Ok(format!(
            "https://s3.amazonaws.com/bosh-aws-light-stemcells/{version}/light-bosh-stemcell-{version}-aws-xen-hvm-ubuntu-xenial-go_agent.tgz"
        ))
    }

    fn iaas(&self) -> IaasName {
        IaasName::Aws
    }
}
