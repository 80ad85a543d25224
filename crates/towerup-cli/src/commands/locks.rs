use super::{core_err, Deployment, EXIT_SUCCESS};

/// Print the director's locks as pretty JSON.
pub fn run(deployment: &Deployment) -> Result<u8, String> {
    let session = deployment.config.session()?;
    let raw = deployment.engine.locks(&session).map_err(core_err)?;
    let locks: serde_json::Value = serde_json::from_slice(&raw)
        .map_err(|e| format!("bosh returned invalid locks JSON: {e}"))?;
    println!("{}", json_pretty(&locks)?);
    Ok(EXIT_SUCCESS)
}

fn json_pretty(value: &serde_json::Value) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}
