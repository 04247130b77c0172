/// Native C toolchain runner.
///
/// Each request gets its own scratch directory holding `main.c`, the
/// compiled binary and the captured output. The directory is removed when
/// the `TempDir` guard drops, on every exit path.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use tempfile::TempDir;

use super::config::ToolchainConfig;
use super::process::{run_with_timeout, CommandSpec};
use crate::domain::diagnostics::{parse_compiler_messages, translate_failure, Diagnostic};
use crate::domain::language::Language;
use crate::ports::{ExecutionReport, Toolchain};

const SOURCE_FILE: &str = "main.c";
const BINARY_FILE: &str = "main";

pub struct GccToolchain {
    compiler: String,
    extra_cflags: Vec<String>,
    compile_timeout: Duration,
    run_timeout: Duration,
    temp_dir: Option<PathBuf>,
}

impl GccToolchain {
    pub fn new(config: &ToolchainConfig) -> Self {
        Self {
            compiler: config.c_compiler.clone(),
            extra_cflags: config.extra_cflags.clone(),
            compile_timeout: Duration::from_secs(config.compile_timeout_secs),
            run_timeout: Duration::from_secs(config.run_timeout_secs),
            temp_dir: config.temp_dir.clone(),
        }
    }

    pub fn command_spec(&self) -> CommandSpec {
        build_command_spec(&self.compiler, &self.extra_cflags)
    }

    fn try_execute(&self, source: &str) -> Result<ExecutionReport> {
        let scratch = scratch_dir(self.temp_dir.as_deref())?;
        let dir = scratch.path();
        std::fs::write(dir.join(SOURCE_FILE), source).context("Failed to write main.c")?;

        let mut compile = self.command_spec().to_command(dir);
        let compiled = match run_with_timeout(&mut compile, dir, "compile", self.compile_timeout) {
            Ok(outcome) => outcome,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(ExecutionReport::failed(vec![not_found(&self.compiler)]));
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to execute {}", self.compiler)),
        };

        if compiled.timed_out {
            return Ok(ExecutionReport::failed(vec![Diagnostic::general(format!(
                "compilation timed out after {}s",
                self.compile_timeout.as_secs()
            ))]));
        }
        if !compiled.success() {
            info!("[gcc] compilation failed");
            let diagnostics = if compiled.stderr.trim().is_empty() {
                vec![Diagnostic::general(format!("{} exited with {}", self.compiler, describe_status(compiled.status)))]
            } else {
                translate_failure(&compiled.stderr)
            };
            return Ok(ExecutionReport::failed(diagnostics));
        }

        let mut diagnostics = parse_compiler_messages(&compiled.stderr);
        debug!("[gcc] compiled with {} warnings", diagnostics.len());

        let mut run = CommandSpec::new(dir.join(BINARY_FILE).to_string_lossy(), &[]).to_command(dir);
        let ran = run_with_timeout(&mut run, dir, "run", self.run_timeout).context("Failed to run the compiled program")?;

        if !ran.stderr.trim().is_empty() {
            diagnostics.push(Diagnostic::general(ran.stderr.trim()));
        }
        if ran.timed_out {
            diagnostics.push(Diagnostic::general(format!(
                "execution timed out after {}s",
                self.run_timeout.as_secs()
            )));
        } else if !ran.success() {
            diagnostics.push(Diagnostic::general(format!(
                "program exited with {}",
                describe_status(ran.status)
            )));
        }

        Ok(ExecutionReport {
            diagnostics,
            output: Some(ran.stdout),
        })
    }
}

impl Toolchain for GccToolchain {
    fn execute(&self, source: &str) -> ExecutionReport {
        self.try_execute(source).unwrap_or_else(|e| {
            warn!("[gcc] toolchain failure: {:#}", e);
            ExecutionReport::failed(vec![Diagnostic::general(format!("{:#}", e))])
        })
    }
}

/// Build the compile command (testable without a compiler installed).
pub fn build_command_spec(compiler: &str, extra_cflags: &[String]) -> CommandSpec {
    let mut args = vec![SOURCE_FILE.to_string(), "-o".to_string(), BINARY_FILE.to_string()];
    args.extend(extra_cflags.iter().cloned());
    CommandSpec {
        program: compiler.to_string(),
        args,
    }
}

/// A uniquely named scratch directory, under `parent` when given.
pub(crate) fn scratch_dir(parent: Option<&std::path::Path>) -> Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("mini-compiler-");
    match parent {
        Some(parent) => builder.tempdir_in(parent),
        None => builder.tempdir(),
    }
    .context("Failed to create scratch directory")
}

pub(crate) fn not_found(program: &str) -> Diagnostic {
    let hint = if program == Language::JavaScript.toolchain_command() {
        Language::JavaScript.install_instructions()
    } else {
        Language::C.install_instructions()
    };
    Diagnostic::general(format!("{} not found in PATH. {}", program, hint))
}

pub(crate) fn describe_status(status: Option<std::process::ExitStatus>) -> String {
    match status.and_then(|s| s.code()) {
        Some(code) => format!("status {}", code),
        None => "no exit status (terminated by a signal)".to_string(),
    }
}
