/// Bounded child processes.
///
/// Output is redirected to files inside the caller's scratch directory so a
/// chatty child can never block on a full pipe while we wait for it.

use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Describes a command without running it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn to_command(&self, working_dir: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).current_dir(working_dir);
        command
    }
}

#[derive(Debug)]
pub struct ProcessOutcome {
    /// `None` when the process was killed on timeout.
    pub status: Option<ExitStatus>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        !self.timed_out && self.status.map_or(false, |s| s.success())
    }
}

/// Run `command` to completion or until `timeout` elapses, whichever comes
/// first. On timeout the child is killed and whatever it wrote so far is
/// kept. `label` names the capture files in `scratch`.
pub fn run_with_timeout(
    command: &mut Command,
    scratch: &Path,
    label: &str,
    timeout: Duration,
) -> io::Result<ProcessOutcome> {
    let stdout_path = scratch.join(format!("{}.stdout", label));
    let stderr_path = scratch.join(format!("{}.stderr", label));

    let mut child = command
        .stdin(Stdio::null())
        .stdout(File::create(&stdout_path)?)
        .stderr(File::create(&stderr_path)?)
        .spawn()?;

    let started = Instant::now();
    let (status, timed_out) = loop {
        if let Some(status) = child.try_wait()? {
            break (Some(status), false);
        }
        if started.elapsed() >= timeout {
            warn!("[process] `{}` exceeded {:?}, killing it", label, timeout);
            // The child may exit between try_wait and kill.
            if let Err(e) = child.kill() {
                debug!("[process] kill failed: {}", e);
            }
            child.wait()?;
            break (None, true);
        }
        thread::sleep(POLL_INTERVAL);
    };

    debug!("[process] `{}` finished in {:?}", label, started.elapsed());
    Ok(ProcessOutcome {
        status,
        stdout: read_lossy(&stdout_path)?,
        stderr: read_lossy(&stderr_path)?,
        timed_out,
    })
}

fn read_lossy(path: &Path) -> io::Result<String> {
    Ok(String::from_utf8_lossy(&fs::read(path)?).into_owned())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_captures_output() {
        let dir = TempDir::new().unwrap();
        let mut command = CommandSpec::new("sh", &["-c", "echo out; echo err >&2"]).to_command(dir.path());
        let outcome = run_with_timeout(&mut command, dir.path(), "echo", Duration::from_secs(5)).unwrap();
        assert!(outcome.success());
        assert_eq!(outcome.stdout, "out\n");
        assert_eq!(outcome.stderr, "err\n");
    }

    #[test]
    fn test_timeout_kills_child_and_keeps_output() {
        let dir = TempDir::new().unwrap();
        let mut command = CommandSpec::new("sh", &["-c", "echo started; sleep 10"]).to_command(dir.path());
        let outcome = run_with_timeout(&mut command, dir.path(), "sleep", Duration::from_millis(300)).unwrap();
        assert!(outcome.timed_out);
        assert!(!outcome.success());
        assert_eq!(outcome.stdout, "started\n");
    }

    #[test]
    fn test_missing_program() {
        let dir = TempDir::new().unwrap();
        let mut command = CommandSpec::new("definitely-not-a-real-tool", &[]).to_command(dir.path());
        let err = run_with_timeout(&mut command, dir.path(), "missing", Duration::from_secs(1)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
