use crate::{CommandRunner, RunnerError, DETACH_NOTICE, PROGRESS_MARKER};
use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdout, Command, Stdio};
use tracing::{debug, info};

/// Spawns real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn spawn(bin: &str, args: &[String]) -> Result<(Child, ChildStdout), RunnerError> {
        debug!(bin, args = %crate::display_args(args), "spawning");
        let mut child = Command::new(bin)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| RunnerError::spawn(bin, args, e))?;
        let stdout = child.stdout.take().ok_or_else(|| {
            RunnerError::spawn(bin, args, io::Error::other("stdout was not captured"))
        })?;
        Ok((child, stdout))
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, bin: &str, args: &[String], sink: &mut dyn Write) -> Result<(), RunnerError> {
        let (mut child, mut stdout) = Self::spawn(bin, args)?;
        let copied = io::copy(&mut stdout, sink);
        if let Err(e) = &copied {
            // Keep the pipe flowing so the child can finish and be reaped.
            debug!(bin, "output sink failed, discarding remaining output: {e}");
            io::copy(&mut stdout, &mut io::sink())?;
        }
        let status = child.wait()?;
        copied?;
        sink.flush()?;
        if !status.success() {
            return Err(RunnerError::failed(bin, args, status));
        }
        Ok(())
    }

    fn run_detached(
        &self,
        bin: &str,
        args: &[String],
        sink: &mut dyn Write,
    ) -> Result<(), RunnerError> {
        let (mut child, stdout) = Self::spawn(bin, args)?;
        let mut reader = BufReader::new(stdout);
        let mut line = Vec::new();

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            if line.last() != Some(&b'\n') {
                line.push(b'\n');
            }
            sink.write_all(&line)?;
            if String::from_utf8_lossy(&line).contains(PROGRESS_MARKER) {
                sink.write_all(DETACH_NOTICE.as_bytes())?;
                sink.flush()?;
                // The task carries on inside the director; the local client
                // is left un-awaited.
                info!(bin, pid = child.id(), "deployment underway, detaching");
                return Ok(());
            }
        }

        sink.flush()?;
        let status = child.wait()?;
        debug!(bin, %status, "process exited before detaching");
        Err(RunnerError::not_detached(bin, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_owned(), script.to_owned()]
    }

    #[test]
    fn run_streams_stdout() {
        let mut out = Vec::new();
        ProcessRunner::new()
            .run("/bin/sh", &sh("echo one; echo two"), &mut out)
            .unwrap();
        assert_eq!(out, b"one\ntwo\n");
    }

    #[test]
    fn run_reports_nonzero_exit() {
        let mut out = Vec::new();
        let err = ProcessRunner::new()
            .run("/bin/sh", &sh("echo partial; exit 3"), &mut out)
            .unwrap_err();
        assert!(matches!(err, RunnerError::Failed { .. }));
        assert!(err.to_string().contains("exit status: 3"), "{err}");
        assert_eq!(out, b"partial\n");
    }

    #[test]
    fn run_reports_missing_binary() {
        let err = ProcessRunner::new()
            .run("/nonexistent/towerup-bosh", &[], &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, RunnerError::Spawn { .. }));
    }

    #[test]
    fn detached_handles_unterminated_last_line() {
        let mut out = Vec::new();
        ProcessRunner::new()
            .run_detached("/bin/sh", &sh("printf 'Preparing deployment'"), &mut out)
            .unwrap();
        assert_eq!(out, b"Preparing deployment\nTask started, detaching output\n");
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failing_sink_does_not_wedge_the_child() {
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let result = ProcessRunner::new().run(
                "/bin/sh",
                &sh("head -c 1000000 /dev/zero"),
                &mut BrokenSink,
            );
            let _ = tx.send(result);
        });

        let result = rx
            .recv_timeout(std::time::Duration::from_secs(20))
            .expect("run stayed blocked on the child");
        assert!(matches!(result, Err(RunnerError::Io(_))), "{result:?}");
    }

    #[test]
    fn failing_sink_still_waits_for_exit() {
        let dir = tempfile::tempdir().unwrap();
        let done = dir.path().join("done");
        let script = format!("head -c 200000 /dev/zero; touch {}", done.display());
        let err = ProcessRunner::new()
            .run("/bin/sh", &sh(&script), &mut BrokenSink)
            .unwrap_err();
        assert!(matches!(err, RunnerError::Io(_)));
        assert!(done.exists(), "child did not run to completion");
    }
}
