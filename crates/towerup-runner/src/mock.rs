use crate::{display_args, CommandRunner, RunnerError, DETACH_NOTICE};
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

/// One recorded call to a [`MockRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub bin: String,
    pub args: Vec<String>,
    pub detached: bool,
}

type Hook = Arc<dyn Fn(&Invocation) + Send + Sync>;

/// A [`CommandRunner`] that never spawns anything.
///
/// Every call is recorded, the configured output is written to the sink and
/// the optional hook runs while the call is in flight, so tests can inspect
/// or modify files the caller materialized for the process. Clones share the
/// recorded invocations.
#[derive(Clone, Default)]
pub struct MockRunner {
    calls: Arc<Mutex<Vec<Invocation>>>,
    output: Vec<u8>,
    fail: bool,
    hook: Option<Hook>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_output(mut self, output: &[u8]) -> Self {
        self.output = output.to_vec();
        self
    }

    /// Make every call fail after recording it and running the hook.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    #[must_use]
    pub fn on_run(mut self, hook: impl Fn(&Invocation) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, bin: &str, args: &[String], detached: bool) {
        let invocation = Invocation {
            bin: bin.to_owned(),
            args: args.to_vec(),
            detached,
        };
        if let Some(hook) = &self.hook {
            hook(&invocation);
        }
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(invocation);
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, bin: &str, args: &[String], sink: &mut dyn Write) -> Result<(), RunnerError> {
        self.record(bin, args, false);
        sink.write_all(&self.output)?;
        if self.fail {
            return Err(RunnerError::Failed {
                bin: bin.to_owned(),
                args: display_args(args),
                status: "exit status: 1".to_owned(),
            });
        }
        Ok(())
    }

    fn run_detached(
        &self,
        bin: &str,
        args: &[String],
        sink: &mut dyn Write,
    ) -> Result<(), RunnerError> {
        self.record(bin, args, true);
        sink.write_all(&self.output)?;
        if self.fail {
            return Err(RunnerError::not_detached(bin, args));
        }
        sink.write_all(DETACH_NOTICE.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_writes_output() {
        let runner = MockRunner::new().with_output(b"[]");
        let handle = runner.clone();
        let mut out = Vec::new();
        runner.run("bosh", &["locks".to_owned()], &mut out).unwrap();
        assert_eq!(out, b"[]");
        assert_eq!(
            handle.invocations(),
            vec![Invocation {
                bin: "bosh".to_owned(),
                args: vec!["locks".to_owned()],
                detached: false,
            }]
        );
    }

    #[test]
    fn failing_runner_still_runs_hook() {
        let seen = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&seen);
        let runner = MockRunner::new()
            .failing()
            .on_run(move |_| *counter.lock().unwrap() += 1);
        assert!(runner.run("bosh", &[], &mut Vec::new()).is_err());
        assert!(runner.run_detached("bosh", &[], &mut Vec::new()).is_err());
        assert_eq!(*seen.lock().unwrap(), 2);
    }
}
