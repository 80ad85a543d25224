use super::{core_err, Deployment, EXIT_SUCCESS};
use std::io::Write;
use towerup_iaas::IaasEnvironment;

/// Upload the pinned stemcell, or only print its URL when `url_only` is set.
pub fn run(deployment: &Deployment, url_only: bool) -> Result<u8, String> {
    let mut out = std::io::stdout().lock();
    if url_only {
        let url = deployment
            .environment
            .configure_concourse_stemcell()
            .map_err(|e| format!("configuration error: {e}"))?;
        writeln!(out, "{url}").map_err(|e| e.to_string())?;
        return Ok(EXIT_SUCCESS);
    }

    let session = deployment.config.session()?;
    deployment
        .engine
        .upload_concourse_stemcell(&deployment.environment, &session, &mut out)
        .map_err(core_err)?;
    Ok(EXIT_SUCCESS)
}
