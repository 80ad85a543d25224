use super::{core_err, Deployment, EXIT_SUCCESS};
use std::io::Write;

pub fn run(deployment: &Deployment) -> Result<u8, String> {
    let store = deployment.open_store()?;
    let credentials = deployment.config.credentials()?;

    let mut out = std::io::stdout().lock();
    deployment
        .engine
        .delete_env(
            &store,
            &deployment.environment,
            &credentials,
            &deployment.config.director.tags,
            &mut out,
        )
        .map_err(core_err)?;

    writeln!(out, "director {} deleted", deployment.config.director.ip)
        .map_err(|e| e.to_string())?;
    Ok(EXIT_SUCCESS)
}
