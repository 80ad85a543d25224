use std::fmt;

/// The BOSH action a lifecycle pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvAction {
    CreateEnv,
    DeleteEnv,
}

impl EnvAction {
    pub fn as_str(self) -> &'static str {
        match self {
            EnvAction::CreateEnv => "create-env",
            EnvAction::DeleteEnv => "delete-env",
        }
    }
}

impl fmt::Display for EnvAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Steps of one `create-env`/`delete-env` pass, in order. Used to label
/// progress in logs and I/O errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Render,
    Interpolate,
    Hydrate,
    Materialize,
    Invoke,
    Persist,
    Cleanup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Render => "render",
            Phase::Interpolate => "interpolate",
            Phase::Hydrate => "hydrate",
            Phase::Materialize => "materialize",
            Phase::Invoke => "invoke",
            Phase::Persist => "persist",
            Phase::Cleanup => "cleanup",
        };
        f.write_str(s)
    }
}
