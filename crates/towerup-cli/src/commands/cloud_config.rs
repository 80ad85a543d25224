use super::{core_err, Deployment, EXIT_SUCCESS};
use std::io::Write;
use towerup_iaas::IaasEnvironment;

/// Apply the cloud-config, or only print it when `render_only` is set.
pub fn run(deployment: &Deployment, render_only: bool) -> Result<u8, String> {
    let mut out = std::io::stdout().lock();
    if render_only {
        let rendered = deployment
            .environment
            .configure_director_cloud_config()
            .map_err(|e| format!("configuration error: {e}"))?;
        out.write_all(rendered.as_bytes())
            .map_err(|e| e.to_string())?;
        return Ok(EXIT_SUCCESS);
    }

    let session = deployment.config.session()?;
    deployment
        .engine
        .update_cloud_config(&deployment.environment, &session, &mut out)
        .map_err(core_err)?;
    Ok(EXIT_SUCCESS)
}
