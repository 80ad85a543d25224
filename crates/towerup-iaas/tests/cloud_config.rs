use towerup_iaas::{
    AwsEnvironment, AwsWorkerType, ConfigError, GcpEnvironment, GcpWorkerType, IaasEnvironment,
};
use towerup_template::{validate_simple, TemplateError};

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {path}: {e}"))
}

/// Every template field set to its own name, so the fixtures show exactly
/// where each field lands.
fn aws() -> AwsEnvironment {
    AwsEnvironment {
        az: "az".to_owned(),
        vm_security_group: "vm_security_group".to_owned(),
        atc_security_group: "atc_security_group".to_owned(),
        public_subnet_id: "public_subnet_id".to_owned(),
        private_subnet_id: "private_subnet_id".to_owned(),
        public_cidr: "public_cidr".to_owned(),
        public_cidr_gateway: "public_cidr_gateway".to_owned(),
        public_cidr_reserved: "public_cidr_reserved".to_owned(),
        public_cidr_static: "public_cidr_static".to_owned(),
        private_cidr: "private_cidr".to_owned(),
        private_cidr_gateway: "private_cidr_gateway".to_owned(),
        private_cidr_reserved: "private_cidr_reserved".to_owned(),
        spot: false,
        worker_type: AwsWorkerType::M4,
        ..AwsEnvironment::default()
    }
}

fn gcp() -> GcpEnvironment {
    GcpEnvironment {
        zone: "zone".to_owned(),
        network: "network".to_owned(),
        public_subnetwork: "public_subnetwork".to_owned(),
        private_subnetwork: "private_subnetwork".to_owned(),
        public_cidr: "public_cidr".to_owned(),
        public_cidr_gateway: "public_cidr_gateway".to_owned(),
        public_cidr_reserved: "public_cidr_reserved".to_owned(),
        public_cidr_static: "public_cidr_static".to_owned(),
        private_cidr: "private_cidr".to_owned(),
        private_cidr_gateway: "private_cidr_gateway".to_owned(),
        private_cidr_reserved: "private_cidr_reserved".to_owned(),
        spot: false,
        worker_type: GcpWorkerType::N1,
        ..GcpEnvironment::default()
    }
}

#[test]
fn aws_full_defaults() {
    let out = aws().configure_director_cloud_config().unwrap();
    assert_eq!(out, fixture("aws_cloud_config_full.yml"));
}

#[test]
fn aws_spot_enabled() {
    let env = AwsEnvironment {
        spot: true,
        ..aws()
    };
    let out = env.configure_director_cloud_config().unwrap();
    assert_eq!(out, fixture("aws_cloud_config_spot.yml"));
}

#[test]
fn aws_spot_disabled() {
    let env = AwsEnvironment {
        spot: false,
        ..aws()
    };
    let out = env.configure_director_cloud_config().unwrap();
    assert_eq!(out, fixture("aws_cloud_config_no_spot.yml"));
}

#[test]
fn aws_each_worker_type() {
    for (worker_type, name) in [
        (AwsWorkerType::M4, "aws_cloud_config_m4.yml"),
        (AwsWorkerType::M5, "aws_cloud_config_m5.yml"),
        (AwsWorkerType::M5a, "aws_cloud_config_m5a.yml"),
    ] {
        let env = AwsEnvironment {
            worker_type,
            ..aws()
        };
        let out = env.configure_director_cloud_config().unwrap();
        assert_eq!(out, fixture(name), "worker type {worker_type}");
    }
}

#[test]
fn gcp_full_defaults() {
    let out = gcp().configure_director_cloud_config().unwrap();
    assert_eq!(out, fixture("gcp_cloud_config_full.yml"));
}

#[test]
fn gcp_spot_enabled() {
    let env = GcpEnvironment {
        spot: true,
        ..gcp()
    };
    let out = env.configure_director_cloud_config().unwrap();
    assert_eq!(out, fixture("gcp_cloud_config_spot.yml"));
}

#[test]
fn gcp_each_worker_type() {
    let n1 = gcp().configure_director_cloud_config().unwrap();
    assert_eq!(n1, fixture("gcp_cloud_config_full.yml"));

    let env = GcpEnvironment {
        worker_type: GcpWorkerType::N2,
        ..gcp()
    };
    let n2 = env.configure_director_cloud_config().unwrap();
    assert_eq!(n2, fixture("gcp_cloud_config_n2.yml"));
}

#[test]
fn builtin_templates_match_parameter_structs() {
    let aws = aws();
    validate_simple("aws", &aws.assets.aws.cloud_config, &aws.cloud_config_params()).unwrap();
    let gcp = gcp();
    validate_simple("gcp", &gcp.assets.gcp.cloud_config, &gcp.cloud_config_params()).unwrap();
}

#[test]
fn template_drift_is_rejected() {
    let mut env = aws();
    env.assets.aws.cloud_config = env.assets.aws.cloud_config.replace("{{ atc_security_group }}", "sg-fixed");
    let err = env.configure_director_cloud_config().unwrap_err();
    assert!(
        matches!(&err, ConfigError::Template(TemplateError::UnusedField { field, .. }) if field == "atc_security_group"),
        "{err}"
    );

    let mut env = gcp();
    env.assets.gcp.cloud_config.push_str("labels: {{ project_id }}\n");
    let err = env.configure_director_cloud_config().unwrap_err();
    assert!(
        matches!(&err, ConfigError::Template(TemplateError::UnknownField { name, .. }) if name == "project_id"),
        "{err}"
    );
}
