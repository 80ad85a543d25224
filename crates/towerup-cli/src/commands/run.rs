use super::{core_err, Deployment, EXIT_SUCCESS};

/// Pass `action` and `flags` through to bosh, scoped to the Concourse
/// deployment.
pub fn run(deployment: &Deployment, action: &str, detach: bool, flags: &[String]) -> Result<u8, String> {
    let session = deployment.config.session()?;
    deployment
        .engine
        .run_authenticated_command(action, &session, detach, &mut std::io::stdout().lock(), flags)
        .map_err(core_err)?;
    Ok(EXIT_SUCCESS)
}
