//! Scripted command runner for tests

use std::cell::RefCell;
use std::collections::HashSet;

use super::{CommandOutput, CommandRunner, CommandSpec, OutputMode, RunOutcome};
use crate::error::{Result, UpdaterError};

/// Runner that answers from a script and records what was executed
///
/// Responses are matched by command-line prefix (including any `sudo`);
/// the first matching entry wins. Unscripted commands exit 0 with no output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: Vec<(String, CommandOutput)>,
    spawn_failures: HashSet<String>,
    missing: HashSet<String>,
    executed: RefCell<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the exit code and output for commands starting with `prefix`
    pub fn respond(mut self, prefix: &str, exit_code: i32, output: &str) -> Self {
        self.responses.push((
            prefix.to_string(),
            CommandOutput {
                exit_code,
                output: output.to_string(),
            },
        ));
        self
    }

    /// Pretend `program` is not installed
    pub fn missing(mut self, program: &str) -> Self {
        self.missing.insert(program.to_string());
        self
    }

    /// Make commands starting with `prefix` fail to start
    pub fn spawn_failure(mut self, prefix: &str) -> Self {
        self.spawn_failures.insert(prefix.to_string());
        self
    }

    /// Command lines that were executed, in order
    pub fn executed(&self) -> Vec<String> {
        self.executed.borrow().clone()
    }

    /// Whether any executed command starts with `prefix`
    pub fn ran(&self, prefix: &str) -> bool {
        self.executed.borrow().iter().any(|c| c.starts_with(prefix))
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, spec: &CommandSpec, _mode: OutputMode) -> Result<RunOutcome> {
        if self.missing.contains(&spec.program) {
            return Ok(RunOutcome::NotAvailable {
                program: spec.program.clone(),
            });
        }
        let line = spec.to_string();
        if self.spawn_failures.iter().any(|p| line.starts_with(p)) {
            return Err(UpdaterError::CommandSpawnFailed {
                command: line,
                reason: "scripted spawn failure".to_string(),
            });
        }
        self.executed.borrow_mut().push(line.clone());
        let output = self
            .responses
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_default();
        Ok(RunOutcome::Completed(output))
    }
}
