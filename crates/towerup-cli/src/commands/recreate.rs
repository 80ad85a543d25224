use super::{core_err, Deployment, EXIT_SUCCESS};

pub fn run(deployment: &Deployment) -> Result<u8, String> {
    let session = deployment.config.session()?;
    deployment
        .engine
        .recreate(&session, &mut std::io::stdout().lock())
        .map_err(core_err)?;
    Ok(EXIT_SUCCESS)
}
