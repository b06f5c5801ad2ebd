//! Command runner
//!
//! Executes one external command and reports its exit code and output.
//! A program missing from the search path is reported as
//! [`RunOutcome::NotAvailable`] instead of an error so that missing tools
//! become soft skips.

use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::{Result, UpdaterError};
use crate::ui;

#[cfg(test)]
pub mod testing;

/// Program prefixed to privileged commands
const SUDO: &str = "sudo";

/// An external command line with an optional working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub privileged: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            privileged: false,
        }
    }

    /// Command that runs through sudo
    pub fn privileged(program: impl Into<String>) -> Self {
        Self {
            privileged: true,
            ..Self::new(program)
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append `arg` only when `condition` holds
    #[must_use]
    pub fn arg_if(self, condition: bool, arg: impl Into<String>) -> Self {
        if condition { self.arg(arg) } else { self }
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// sudo may ask for a password on the terminal; nothing may draw over it
    pub fn shows_spinner(&self) -> bool {
        !self.privileged
    }

    /// Full argument vector including the sudo prefix
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 2);
        if self.privileged {
            argv.push(SUDO.to_string());
        }
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv().join(" "))
    }
}

/// How the child's output is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Inherit the terminal so the tool can show progress and ask for passwords
    Stream,
    /// Collect stdout and stderr for inspection
    Capture,
}

/// Exit code and combined output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    /// Combined stdout and stderr; empty for streamed commands
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Result of asking the runner to execute a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(CommandOutput),
    /// The program (or sudo) is not on the search path
    NotAvailable { program: String },
}

/// Executes external commands
///
/// Implemented by [`SystemRunner`] for real runs, [`DryRunRunner`] for
/// `--dry-run`, and by scripted doubles in tests.
pub trait CommandRunner {
    /// Run `spec` to completion
    ///
    /// Returns `Err` only when a present program could not be started.
    fn run(&self, spec: &CommandSpec, mode: OutputMode) -> Result<RunOutcome>;
}

/// First program of `spec` that cannot be found on the search path
fn missing_program(spec: &CommandSpec) -> Option<String> {
    if spec.privileged && which::which(SUDO).is_err() {
        return Some(SUDO.to_string());
    }
    // Absolute paths (e.g. the MacUpdater client) are checked directly
    let path = std::path::Path::new(&spec.program);
    if path.is_absolute() {
        return (!path.exists()).then(|| spec.program.clone());
    }
    which::which(&spec.program)
        .is_err()
        .then(|| spec.program.clone())
}

/// Runs commands as child processes of the updater
#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn build(spec: &CommandSpec) -> Command {
        let argv = spec.argv();
        let mut command = Command::new(&argv[0]);
        command.args(&argv[1..]);
        if let Some(dir) = &spec.cwd {
            command.current_dir(dir);
        }
        command
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec, mode: OutputMode) -> Result<RunOutcome> {
        if let Some(program) = missing_program(spec) {
            tracing::debug!(command = %spec, %program, "program not found on search path");
            return Ok(RunOutcome::NotAvailable { program });
        }

        tracing::debug!(command = %spec, ?mode, cwd = ?spec.cwd, "running command");
        let mut command = Self::build(spec);

        let spawn_error = |e: std::io::Error| UpdaterError::CommandSpawnFailed {
            command: spec.to_string(),
            reason: e.to_string(),
        };

        let output = match mode {
            OutputMode::Stream => {
                let status = command.status().map_err(spawn_error)?;
                CommandOutput {
                    exit_code: status.code().unwrap_or(-1),
                    output: String::new(),
                }
            }
            OutputMode::Capture => {
                let spinner = spec
                    .shows_spinner()
                    .then(|| ui::spinner(&format!("Running {spec}...")));
                let result = command
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .output();
                if let Some(spinner) = spinner {
                    spinner.finish_and_clear();
                }
                let raw = result.map_err(spawn_error)?;

                let mut combined = String::from_utf8_lossy(&raw.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&raw.stderr);
                if !stderr.is_empty() {
                    if !combined.is_empty() && !combined.ends_with('\n') {
                        combined.push('\n');
                    }
                    combined.push_str(&stderr);
                }
                CommandOutput {
                    exit_code: raw.status.code().unwrap_or(-1),
                    output: combined,
                }
            }
        };

        tracing::debug!(command = %spec, exit_code = output.exit_code, "command finished");
        Ok(RunOutcome::Completed(output))
    }
}

/// Reports what would run without starting any process
///
/// Tool availability is still checked so the summary matches a real run.
#[derive(Debug, Default)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn run(&self, spec: &CommandSpec, _mode: OutputMode) -> Result<RunOutcome> {
        if let Some(program) = missing_program(spec) {
            return Ok(RunOutcome::NotAvailable { program });
        }
        println!("{}", ui::dry_run_line(spec));
        Ok(RunOutcome::Completed(CommandOutput::default()))
    }
}
