//! Orchestrator
//!
//! Runs the ordered step list one step at a time and tallies the outcomes.
//! No step outcome ever aborts the run: failures, missing tools and declined
//! prompts are recorded as [`StepResult`]s and execution continues with the
//! next step.

use crate::config::{Capability, RunConfiguration};
use crate::confirm::{ActionKind, ConfirmationGate, Prompter};
use crate::plan::build_plan;
use crate::platform::PlatformProfile;
use crate::runner::{CommandOutput, CommandRunner, CommandSpec, OutputMode, RunOutcome};
use crate::step::{Action, Applicability, Outcome, Step, StepResult};
use crate::ui;

mod procedures;

/// Tallied outcome of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Failed steps in execution order, with their failure message
    pub failed_steps: Vec<String>,
    /// Follow-ups for the operator (postponed restarts, reboots)
    pub pending_actions: Vec<String>,
    pub results: Vec<StepResult>,
}

impl Summary {
    pub fn new(results: Vec<StepResult>, pending_actions: Vec<String>) -> Self {
        let count = |f: fn(&StepResult) -> bool| results.iter().filter(|&r| f(r)).count();
        Self {
            total: results.len(),
            succeeded: count(StepResult::succeeded),
            failed: count(StepResult::failed),
            skipped: count(StepResult::skipped),
            failed_steps: results
                .iter()
                .filter(|r| r.failed())
                .map(ToString::to_string)
                .collect(),
            pending_actions,
            results,
        }
    }

    /// Skips never count against success
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn exit_code(&self) -> i32 {
        i32::from(!self.is_success())
    }
}

/// Append-only record of a run in progress
#[derive(Debug, Default)]
struct Report {
    results: Vec<StepResult>,
    pending_actions: Vec<String>,
}

impl Report {
    fn record(&mut self, result: StepResult) {
        match result.outcome {
            Outcome::Succeeded => ui::step_succeeded(&result.name, &result.message),
            Outcome::CommandFailed => ui::step_failed(&result.name, &result.message),
            _ => ui::step_skipped(&result.name, &result.message),
        }
        tracing::debug!(step = %result.name, outcome = ?result.outcome, "recorded step result");
        self.results.push(result);
    }

    fn pending(&mut self, action: impl Into<String>) {
        self.pending_actions.push(action.into());
    }
}

/// What happened when a command was handed to the runner
#[derive(Debug)]
enum Execution {
    Finished(CommandOutput),
    Unavailable(String),
    /// The program exists but could not be started
    NotStarted(String),
}

impl Execution {
    /// Classify as the result of the step `name`
    fn into_result(self, name: &str) -> StepResult {
        match self {
            Execution::Finished(output) if output.success() => StepResult::success(name, ""),
            Execution::Finished(output) => {
                StepResult::failure(name, format!("failed with exit code {}", output.exit_code))
            }
            Execution::Unavailable(program) => StepResult::new(
                name,
                Outcome::ToolUnavailable,
                format!("{program} is not available"),
            ),
            Execution::NotStarted(reason) => StepResult::failure(name, reason),
        }
    }
}

/// Executes steps with a runner and a confirmation gate
pub struct Orchestrator<'a> {
    config: &'a RunConfiguration,
    runner: &'a dyn CommandRunner,
    gate: ConfirmationGate<'a>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a RunConfiguration,
        runner: &'a dyn CommandRunner,
        prompter: &'a dyn Prompter,
    ) -> Self {
        Self {
            config,
            runner,
            gate: ConfirmationGate::new(prompter),
        }
    }

    /// Build the step list for `profile` and run it
    pub fn run(&self, profile: &PlatformProfile) -> Summary {
        let steps = build_plan(profile, self.config);
        self.execute(&steps)
    }

    /// Run `steps` in order
    pub fn execute(&self, steps: &[Step]) -> Summary {
        let mut report = Report::default();
        for step in steps {
            self.run_step(step, &mut report);
        }
        Summary::new(report.results, report.pending_actions)
    }

    fn run_step(&self, step: &Step, report: &mut Report) {
        if self.config.skips(step.capability) {
            report.record(StepResult::new(
                &step.name,
                Outcome::Disabled,
                self.disabled_reason(step.capability),
            ));
            return;
        }
        if let Applicability::Inapplicable(reason) = &step.applicability {
            report.record(StepResult::new(&step.name, Outcome::Inapplicable, reason));
            return;
        }

        ui::banner(&step.name, Some(&step.action.describe()));
        if step.requires_manual_confirmation() && self.config.auto_confirm {
            ui::info("Service restarts and reboots are always confirmed, even in auto-yes mode");
        }

        if let Some(kind) = step.gate {
            if !self.confirm(kind, &format!("{}?", step.name)) {
                report.record(StepResult::new(&step.name, Outcome::UserDeclined, "declined"));
                return;
            }
        }

        match &step.action {
            Action::Command(spec) => {
                let result = self.execute_command(spec, OutputMode::Stream).into_result(&step.name);
                report.record(result);
            }
            Action::Procedure(procedure) => self.run_procedure(&step.name, procedure, report),
        }
    }

    fn disabled_reason(&self, capability: Capability) -> String {
        if capability == Capability::MacUpdater && !self.config.skip_mac_apps {
            return format!("not enabled (use {})", capability.flag());
        }
        if capability == Capability::MacUpdater {
            return format!("disabled by {}", Capability::MacApps.flag());
        }
        format!("disabled by {}", capability.flag())
    }

    /// Ask the gate; a prompt that cannot be shown counts as "no"
    fn confirm(&self, kind: ActionKind, question: &str) -> bool {
        self.gate
            .should_proceed(kind, question, self.config)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, question, "prompt failed, treating as declined");
                ui::warn(&format!("Could not ask \"{question}\"; treating as declined"));
                false
            })
    }

    fn execute_command(&self, spec: &CommandSpec, mode: OutputMode) -> Execution {
        match self.runner.run(spec, mode) {
            Ok(RunOutcome::Completed(output)) => Execution::Finished(output),
            Ok(RunOutcome::NotAvailable { program }) => Execution::Unavailable(program),
            Err(e) => {
                tracing::warn!(command = %spec, error = %e, "command could not be started");
                Execution::NotStarted(e.to_string())
            }
        }
    }

    /// Run one command of a multi-command procedure, announcing it first
    fn sub_command(&self, spec: &CommandSpec, mode: OutputMode) -> Execution {
        if !self.config.dry_run {
            ui::sub_command(spec);
        }
        self.execute_command(spec, mode)
    }
}
