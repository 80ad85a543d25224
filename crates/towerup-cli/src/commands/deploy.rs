use super::{core_err, Deployment, EXIT_SUCCESS};
use std::io::Write;
use tracing::info;

/// Create the director, then give it a cloud-config and a stemcell.
pub fn run(deployment: &Deployment) -> Result<u8, String> {
    let store = deployment.open_store()?;
    let credentials = deployment.config.credentials()?;
    let session = deployment.config.session()?;
    let engine = &deployment.engine;
    let env = &deployment.environment;

    let mut out = std::io::stdout().lock();
    engine
        .create_env(&store, env, &credentials, &deployment.config.director.tags, &mut out)
        .map_err(core_err)?;
    engine
        .update_cloud_config(env, &session, &mut out)
        .map_err(core_err)?;
    engine
        .upload_concourse_stemcell(env, &session, &mut out)
        .map_err(core_err)?;

    info!(bucket = store.bucket(), "state persisted");
    writeln!(out, "director ready at https://{}", session.ip).map_err(|e| e.to_string())?;
    Ok(EXIT_SUCCESS)
}
