//! Steps and their results
//!
//! A [`Step`] is a value object: a name, the capability it touches, whether
//! it applies to this host, and what to execute. Steps never run themselves;
//! the orchestrator executes them and records a [`StepResult`] each.

use std::fmt;
use std::path::PathBuf;

use crate::config::Capability;
use crate::confirm::ActionKind;
use crate::platform::{ComposeProject, TpmInstall};
use crate::runner::CommandSpec;

/// Which compose front end runs the project commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeTool {
    /// The standalone `docker-compose` binary
    Standalone,
    /// The `docker compose` CLI plugin
    Plugin,
}

impl ComposeTool {
    /// Base compose command for `project`, run from its directory
    pub fn command(self, project: &ComposeProject) -> CommandSpec {
        let spec = match self {
            ComposeTool::Standalone => CommandSpec::new("docker-compose"),
            ComposeTool::Plugin => CommandSpec::new("docker").arg("compose"),
        };
        spec.current_dir(&project.dir)
    }
}

/// Multi-command work whose later commands depend on earlier output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Procedure {
    /// Restart services the package manager reports as stale, one by one
    ServiceRestarts { checker: CommandSpec },
    /// Offer a reboot with countdown when the package manager requires one
    RebootCheck { checker: CommandSpec },
    /// Pull images and bring the project up only when something was fetched
    ComposeRefresh {
        project: ComposeProject,
        tool: ComposeTool,
    },
    MacosSoftwareUpdate,
    MasUpgrade,
    GemUpdate,
    NpmGlobalUpdate,
    PipUpgrade,
    FirmwareUpdate,
    TmuxPlugins { tpm: TpmInstall },
    OhMyZsh { script: PathBuf },
}

impl Procedure {
    /// Command line shown in the step banner
    pub fn describe(&self) -> String {
        match self {
            Procedure::ServiceRestarts { checker } => format!("{checker} -s"),
            Procedure::RebootCheck { checker } => format!("{checker} -r"),
            Procedure::ComposeRefresh { project, tool } => {
                format!("{} pull (in {})", tool.command(project), project.dir.display())
            }
            Procedure::MacosSoftwareUpdate => "sudo softwareupdate -ia".to_string(),
            Procedure::MasUpgrade => "mas outdated && mas upgrade".to_string(),
            Procedure::GemUpdate => {
                "gem outdated --user-install && gem update --user-install".to_string()
            }
            Procedure::NpmGlobalUpdate => "npm outdated -g && npm update -g".to_string(),
            Procedure::PipUpgrade => {
                "pip3 list --outdated && pip3 install -U <package>".to_string()
            }
            Procedure::FirmwareUpdate => {
                "sudo fwupdmgr refresh && sudo fwupdmgr get-updates && sudo fwupdmgr update"
                    .to_string()
            }
            Procedure::TmuxPlugins { tpm } => match &tpm.update_script {
                Some(script) => format!("bash {} all", script.display()),
                None => format!("{}/bin/update_plugins all", tpm.base.display()),
            },
            Procedure::OhMyZsh { script } => format!("zsh {}", script.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Command(CommandSpec),
    Procedure(Procedure),
}

impl Action {
    pub fn describe(&self) -> String {
        match self {
            Action::Command(spec) => spec.to_string(),
            Action::Procedure(procedure) => procedure.describe(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applicability {
    Applicable,
    /// Not meaningful on this host; the reason is shown as the skip message
    Inapplicable(String),
}

/// A named unit of maintenance work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub capability: Capability,
    pub applicability: Applicability,
    /// Confirmation asked before the action starts, if any
    pub gate: Option<ActionKind>,
    pub action: Action,
}

impl Step {
    pub fn command(name: impl Into<String>, capability: Capability, spec: CommandSpec) -> Self {
        Self {
            name: name.into(),
            capability,
            applicability: Applicability::Applicable,
            gate: None,
            action: Action::Command(spec),
        }
    }

    pub fn procedure(
        name: impl Into<String>,
        capability: Capability,
        procedure: Procedure,
    ) -> Self {
        Self {
            name: name.into(),
            capability,
            applicability: Applicability::Applicable,
            gate: None,
            action: Action::Procedure(procedure),
        }
    }

    /// Step that is recorded as skipped on every run
    pub fn inapplicable(
        name: impl Into<String>,
        capability: Capability,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            applicability: Applicability::Inapplicable(reason.into()),
            ..Self::command(name, capability, CommandSpec::new("true"))
        }
    }

    /// Mark the step inapplicable unless `condition` holds
    #[must_use]
    pub fn when(mut self, condition: bool, reason: impl Into<String>) -> Self {
        if !condition && self.applicable() {
            self.applicability = Applicability::Inapplicable(reason.into());
        }
        self
    }

    #[must_use]
    pub fn gated(mut self, kind: ActionKind) -> Self {
        self.gate = Some(kind);
        self
    }

    pub fn applicable(&self) -> bool {
        self.applicability == Applicability::Applicable
    }

    /// Whether the step can restart services or reboot the machine
    ///
    /// Such steps ask the operator even in auto-confirm mode.
    pub fn requires_manual_confirmation(&self) -> bool {
        matches!(
            self.action,
            Action::Procedure(Procedure::ServiceRestarts { .. } | Procedure::RebootCheck { .. })
        ) || self.gate == Some(ActionKind::Sensitive)
    }
}

/// How a step (or one service of a restart sub-flow) ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    /// Non-zero exit, or a program that could not be started
    CommandFailed,
    /// The program is not on the search path
    ToolUnavailable,
    /// Output was not recognised; nothing was done
    DetectionAmbiguous,
    /// The operator answered no
    UserDeclined,
    /// Turned off by a command-line flag
    Disabled,
    /// Not meaningful on this host
    Inapplicable,
}

impl Outcome {
    pub fn is_skip(self) -> bool {
        !matches!(self, Outcome::Succeeded | Outcome::CommandFailed)
    }
}

/// Recorded outcome of one executed (or skipped) step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub name: String,
    pub outcome: Outcome,
    pub message: String,
}

impl StepResult {
    pub fn new(name: impl Into<String>, outcome: Outcome, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome,
            message: message.into(),
        }
    }

    pub fn success(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, Outcome::Succeeded, message)
    }

    pub fn failure(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, Outcome::CommandFailed, message)
    }

    pub fn succeeded(&self) -> bool {
        self.outcome == Outcome::Succeeded
    }

    pub fn failed(&self) -> bool {
        self.outcome == Outcome::CommandFailed
    }

    pub fn skipped(&self) -> bool {
        self.outcome.is_skip()
    }
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}
