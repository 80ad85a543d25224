//! Execution of the external reconciliation binary.
//!
//! [`CommandRunner`] is the seam the lifecycle engine drives: a blocking
//! [`CommandRunner::run`] that streams stdout into a sink, and
//! [`CommandRunner::run_detached`] that returns as soon as the process
//! reports a deployment is underway. [`ProcessRunner`] spawns real
//! processes; [`MockRunner`] records invocations for tests.

pub mod mock;
pub mod process;

pub use mock::{Invocation, MockRunner};
pub use process::ProcessRunner;

use std::io::Write;
use thiserror::Error;

/// Line content that signals a deploy is far enough along to detach.
pub const PROGRESS_MARKER: &str = "Preparing deployment";

/// Written to the sink when detaching.
pub const DETACH_NOTICE: &str = "Task started, detaching output\n";

const REDACTED: &str = "<redacted>";
const SECRET_FLAGS: &[&str] = &["--client-secret"];

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to start `{bin} {args}`: {source}")]
    Spawn {
        bin: String,
        args: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{bin} {args}` failed: {status}")]
    Failed {
        bin: String,
        args: String,
        status: String,
    },
    #[error("`{bin} {args}` finished without reporting 'Preparing deployment'")]
    NotDetached { bin: String, args: String },
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunnerError {
    pub(crate) fn spawn(bin: &str, args: &[String], source: std::io::Error) -> Self {
        RunnerError::Spawn {
            bin: bin.to_owned(),
            args: display_args(args),
            source,
        }
    }

    pub(crate) fn failed(bin: &str, args: &[String], status: impl std::fmt::Display) -> Self {
        RunnerError::Failed {
            bin: bin.to_owned(),
            args: display_args(args),
            status: status.to_string(),
        }
    }

    pub(crate) fn not_detached(bin: &str, args: &[String]) -> Self {
        RunnerError::NotDetached {
            bin: bin.to_owned(),
            args: display_args(args),
        }
    }
}

/// Runs an external binary.
pub trait CommandRunner: Send + Sync {
    /// Run to completion, copying stdout into `sink`. stderr goes to the
    /// caller's stderr. A non-zero exit is an error.
    fn run(&self, bin: &str, args: &[String], sink: &mut dyn Write) -> Result<(), RunnerError>;

    /// Run until a stdout line contains [`PROGRESS_MARKER`], forwarding each
    /// line to `sink`, then return and leave the process running. Reaching
    /// the end of stdout first is an error.
    fn run_detached(
        &self,
        bin: &str,
        args: &[String],
        sink: &mut dyn Write,
    ) -> Result<(), RunnerError>;
}

/// Render an argument vector for diagnostics, hiding secret values.
pub fn display_args(args: &[String]) -> String {
    let mut out = Vec::with_capacity(args.len());
    let mut hide_next = false;
    for arg in args {
        if hide_next {
            out.push(REDACTED.to_owned());
            hide_next = false;
            continue;
        }
        if SECRET_FLAGS.contains(&arg.as_str()) {
            hide_next = true;
            out.push(arg.clone());
        } else if let Some(flag) = SECRET_FLAGS
            .iter()
            .find(|f| arg.strip_prefix(**f).is_some_and(|rest| rest.starts_with('=')))
        {
            out.push(format!("{flag}={REDACTED}"));
        } else {
            out.push(arg.clone());
        }
    }
    out.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn display_args_redacts_client_secret() {
        let shown = display_args(&args(&[
            "--environment",
            "https://10.0.0.6",
            "--client-secret",
            "hunter2",
            "deploy",
        ]));
        assert_eq!(
            shown,
            "--environment https://10.0.0.6 --client-secret <redacted> deploy"
        );
    }

    #[test]
    fn display_args_redacts_inline_form() {
        let shown = display_args(&args(&["--client-secret=hunter2", "locks"]));
        assert_eq!(shown, "--client-secret=<redacted> locks");
    }

    #[test]
    fn display_args_keeps_other_flags() {
        let shown = display_args(&args(&["create-env", "--state=/tmp/s.json", "m.yml"]));
        assert_eq!(shown, "create-env --state=/tmp/s.json m.yml");
    }

    #[test]
    fn errors_never_show_secret() {
        let err = RunnerError::not_detached("bosh", &args(&["--client-secret", "hunter2", "deploy"]));
        let text = err.to_string();
        assert!(!text.contains("hunter2"), "{text}");
        assert!(text.contains("deploy"));
        assert!(text.contains(PROGRESS_MARKER));
    }
}
