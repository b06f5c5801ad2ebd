//! Multi-command procedures
//!
//! Each procedure runs a check first and decides from its output whether
//! (and what) to run next. Unrecognised check output always means "do
//! nothing".

use std::path::Path;

use super::{Execution, Orchestrator, Report};
use crate::confirm::ActionKind;
use crate::detect;
use crate::platform::{ComposeProject, TpmInstall};
use crate::runner::{CommandSpec, OutputMode};
use crate::step::{ComposeTool, Outcome, Procedure, StepResult};
use crate::ui;

/// `npm outdated` exits 1 when it lists outdated packages
const NPM_OUTDATED_CODES: &[i32] = &[0, 1];

/// `fwupdmgr` exit code for conditions it considers non-fatal
const FWUPD_NOTHING_TO_DO: i32 = 2;

/// `needs-restarting -s` lists stale services with either exit code
const RESTART_LISTING_CODES: &[i32] = &[0, 1];

/// `needs-restarting -r` exit code when a reboot is required
const REBOOT_REQUIRED: i32 = 1;

/// Check-then-update pair for tools with an "outdated" listing
struct OutdatedCheck {
    check: CommandSpec,
    accepted_codes: &'static [i32],
    update: CommandSpec,
    up_to_date: &'static str,
}

impl Orchestrator<'_> {
    pub(super) fn run_procedure(&self, name: &str, procedure: &Procedure, report: &mut Report) {
        match procedure {
            Procedure::ServiceRestarts { checker } => self.service_restarts(name, checker, report),
            Procedure::RebootCheck { checker } => self.reboot_check(name, checker, report),
            Procedure::ComposeRefresh { project, tool } => {
                report.record(self.compose_refresh(name, project, *tool));
            }
            Procedure::MacosSoftwareUpdate => self.macos_software_update(name, report),
            Procedure::MasUpgrade => report.record(self.check_then_update(
                name,
                &OutdatedCheck {
                    check: CommandSpec::new("mas").arg("outdated"),
                    accepted_codes: &[0],
                    update: CommandSpec::new("mas").arg("upgrade"),
                    up_to_date: "No outdated App Store apps",
                },
            )),
            Procedure::GemUpdate => report.record(self.check_then_update(
                name,
                &OutdatedCheck {
                    check: CommandSpec::new("gem").args(["outdated", "--user-install"]),
                    accepted_codes: &[0],
                    update: CommandSpec::new("gem").args(["update", "--user-install"]),
                    up_to_date: "No outdated user gems",
                },
            )),
            Procedure::NpmGlobalUpdate => report.record(self.check_then_update(
                name,
                &OutdatedCheck {
                    check: CommandSpec::new("npm").args(["outdated", "-g"]),
                    accepted_codes: NPM_OUTDATED_CODES,
                    update: CommandSpec::new("npm").args(["update", "-g"]),
                    up_to_date: "No outdated global npm packages",
                },
            )),
            Procedure::PipUpgrade => report.record(self.pip_upgrade(name)),
            Procedure::FirmwareUpdate => self.firmware_update(name, report),
            Procedure::TmuxPlugins { tpm } => report.record(self.tmux_plugins(name, tpm)),
            Procedure::OhMyZsh { script } => report.record(self.oh_my_zsh(name, script)),
        }
    }

    /// Restart each stale service after one sensitive confirmation
    ///
    /// Records one result per service, or a single result when there is
    /// nothing to restart.
    fn service_restarts(&self, name: &str, checker: &CommandSpec, report: &mut Report) {
        let check = checker.clone().arg("-s");
        let output = match self.sub_command(&check, OutputMode::Capture) {
            Execution::Finished(output) if RESTART_LISTING_CODES.contains(&output.exit_code) => {
                output
            }
            Execution::Finished(output) => {
                tracing::debug!(exit_code = output.exit_code, "service restart check failed");
                report.record(StepResult::new(
                    name,
                    Outcome::DetectionAmbiguous,
                    "could not determine which services need restarting",
                ));
                return;
            }
            other => {
                report.record(other.into_result(name));
                return;
            }
        };

        let services = detect::parse_restart_services(&output.output);
        if services.is_empty() {
            report.record(StepResult::success(name, "No services need restarting"));
            return;
        }

        ui::listing(
            &format!("{} services need restarting", services.len()),
            &services.join("\n"),
        );
        let question = format!("Restart {} now?", services.join(", "));
        if !self.confirm(ActionKind::Sensitive, &question) {
            for service in &services {
                report.record(StepResult::new(
                    format!("Restart {service}"),
                    Outcome::UserDeclined,
                    "restart declined",
                ));
            }
            report.pending(format!(
                "Restart services when convenient: sudo systemctl restart {}",
                services.join(" ")
            ));
            return;
        }

        for service in &services {
            let restart = CommandSpec::privileged("systemctl").args(["restart", service.as_str()]);
            let result = self
                .sub_command(&restart, OutputMode::Stream)
                .into_result(&format!("Restart {service}"));
            report.record(result);
        }
    }

    /// Offer a reboot, with a cancellable countdown, when one is required
    fn reboot_check(&self, name: &str, checker: &CommandSpec, report: &mut Report) {
        let check = checker.clone().arg("-r");
        match self.sub_command(&check, OutputMode::Capture) {
            Execution::Finished(output) if output.success() => {
                report.record(StepResult::success(name, "System reboot not required"));
                return;
            }
            Execution::Finished(output) if output.exit_code == REBOOT_REQUIRED => {}
            Execution::Finished(_) => {
                report.record(StepResult::new(
                    name,
                    Outcome::DetectionAmbiguous,
                    "could not determine whether a reboot is required",
                ));
                return;
            }
            other => {
                report.record(other.into_result(name));
                return;
            }
        }

        ui::warn("System reboot required: some updates only take effect after a restart");
        let confirmed = self
            .gate
            .confirm_reboot("Reboot the system now?", self.config)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "reboot prompt failed, treating as declined");
                false
            });
        if !confirmed {
            report.record(StepResult::new(name, Outcome::UserDeclined, "reboot postponed"));
            report.pending("Reboot the system when convenient to finish applying updates");
            return;
        }

        let reboot = CommandSpec::privileged("reboot");
        let result = match self.sub_command(&reboot, OutputMode::Stream) {
            Execution::Finished(output) if output.success() => {
                StepResult::success(name, "reboot initiated")
            }
            other => other.into_result(name),
        };
        report.record(result);
    }

    /// Pull images; bring the project up only when something new arrived
    fn compose_refresh(
        &self,
        name: &str,
        project: &ComposeProject,
        tool: ComposeTool,
    ) -> StepResult {
        tracing::debug!(manifest = %project.manifest.display(), "refreshing compose project");
        let pull = tool.command(project).arg("pull");
        let output = match self.sub_command(&pull, OutputMode::Capture) {
            Execution::Finished(output) if output.success() => output,
            Execution::Finished(output) => {
                ui::listing("compose pull output", &output.output);
                return Execution::Finished(output).into_result(name);
            }
            other => return other.into_result(name),
        };

        if !detect::detect_updates(&output.output) {
            return StepResult::success(name, "No image updates, containers left running");
        }

        ui::info("Updated images pulled, recreating containers");
        let up = tool.command(project).args(["up", "-d"]);
        match self.sub_command(&up, OutputMode::Stream) {
            Execution::Finished(output) if output.success() => {
                StepResult::success(name, "images updated and containers recreated")
            }
            other => other.into_result(name),
        }
    }

    fn macos_software_update(&self, name: &str, report: &mut Report) {
        let install = CommandSpec::privileged("softwareupdate").arg("-ia");
        let output = match self.sub_command(&install, OutputMode::Capture) {
            Execution::Finished(output) => output,
            other => {
                report.record(other.into_result(name));
                return;
            }
        };

        if detect::no_software_update(&output.output) {
            report.record(StepResult::success(name, "No new software available"));
            return;
        }
        if detect::has_entries(&output.output) {
            ui::listing("softwareupdate", &output.output);
        }
        if detect::restart_requested(&output.output) {
            report.pending("Restart the Mac to finish installing macOS updates");
        }
        report.record(Execution::Finished(output).into_result(name));
    }

    fn check_then_update(&self, name: &str, check: &OutdatedCheck) -> StepResult {
        let output = match self.sub_command(&check.check, OutputMode::Capture) {
            Execution::Finished(output) if check.accepted_codes.contains(&output.exit_code) => {
                output
            }
            other => return other.into_result(name),
        };

        if !detect::has_entries(&output.output) {
            return StepResult::success(name, check.up_to_date);
        }
        ui::listing("Outdated", &output.output);
        self.sub_command(&check.update, OutputMode::Stream)
            .into_result(name)
    }

    /// Packages that failed to upgrade
    fn upgrade_pip_packages(&self, packages: &[String], user: bool) -> Vec<String> {
        packages
            .iter()
            .filter(|package| {
                let install = CommandSpec::new("pip3")
                    .arg("install")
                    .arg_if(user, "--user")
                    .args(["-U", package.as_str()]);
                !matches!(
                    self.sub_command(&install, OutputMode::Stream),
                    Execution::Finished(output) if output.success()
                )
            })
            .cloned()
            .collect()
    }

    fn outdated_pip_command(user: bool) -> CommandSpec {
        CommandSpec::new("pip3")
            .arg("list")
            .arg_if(user, "--user")
            .args(["--outdated", "--format=columns"])
    }

    /// Upgrade outdated pip packages one by one
    ///
    /// System package failures fail the step; user package failures are
    /// only reported.
    fn pip_upgrade(&self, name: &str) -> StepResult {
        let system_check = Self::outdated_pip_command(false);
        let system = match self.sub_command(&system_check, OutputMode::Capture) {
            Execution::Finished(output) if output.success() => {
                detect::parse_pip_outdated(&output.output)
            }
            other => return other.into_result(name),
        };
        if !system.is_empty() {
            ui::listing("Outdated system packages", &system.join("\n"));
        }
        let system_failures = self.upgrade_pip_packages(&system, false);

        let user_check = Self::outdated_pip_command(true);
        let user = match self.sub_command(&user_check, OutputMode::Capture) {
            Execution::Finished(output) if output.success() => {
                detect::parse_pip_outdated(&output.output)
            }
            _ => {
                ui::warn("Could not list outdated user pip packages");
                Vec::new()
            }
        };
        if !user.is_empty() {
            ui::listing("Outdated user packages", &user.join("\n"));
        }
        let user_failures = self.upgrade_pip_packages(&user, true);
        if !user_failures.is_empty() {
            ui::warn(&format!(
                "User packages not upgraded: {}",
                user_failures.join(", ")
            ));
        }

        if !system_failures.is_empty() {
            return StepResult::failure(
                name,
                format!("could not upgrade {}", system_failures.join(", ")),
            );
        }
        let upgraded = system.len() + user.len() - user_failures.len();
        if upgraded == 0 && user_failures.is_empty() {
            StepResult::success(name, "No outdated pip packages")
        } else {
            StepResult::success(name, format!("upgraded {upgraded} package(s)"))
        }
    }

    fn firmware_update(&self, name: &str, report: &mut Report) {
        let fwupdmgr =
            |args: &[&str]| CommandSpec::privileged("fwupdmgr").args(args.iter().copied());

        match self.sub_command(&fwupdmgr(&["refresh"]), OutputMode::Capture) {
            Execution::Finished(output) if output.success() => {}
            Execution::Finished(output) if output.exit_code == FWUPD_NOTHING_TO_DO => {
                ui::warn("Firmware metadata refresh reported a non-fatal condition, continuing");
            }
            Execution::Finished(output) => {
                ui::warn(&format!(
                    "Firmware metadata refresh failed with exit code {}, continuing",
                    output.exit_code
                ));
            }
            other => {
                report.record(other.into_result(name));
                return;
            }
        }

        let listing = match self.sub_command(&fwupdmgr(&["get-updates"]), OutputMode::Capture) {
            Execution::Finished(output) if output.success() => output,
            Execution::Finished(output) if output.exit_code == FWUPD_NOTHING_TO_DO => {
                report.record(StepResult::success(name, "No firmware updates available"));
                return;
            }
            other => {
                report.record(other.into_result(name));
                return;
            }
        };
        if !detect::firmware_updates_available(&listing.output) {
            report.record(StepResult::success(name, "No firmware updates available"));
            return;
        }

        ui::listing("Available firmware updates", &listing.output);
        let apply = self.config.apply_firmware
            || self.confirm(ActionKind::Routine, "Apply these firmware updates now?");
        if !apply {
            report.record(StepResult::new(name, Outcome::UserDeclined, "updates not applied"));
            report.pending("Firmware updates are available: run 'fwupdmgr update' to apply them");
            return;
        }

        // Forced refresh is best effort; the update reports real problems
        let _ = self.sub_command(&fwupdmgr(&["refresh", "--force"]), OutputMode::Capture);

        let update = fwupdmgr(&["update"]).arg_if(self.config.auto_confirm, "--assume-yes");
        let result = self
            .sub_command(&update, OutputMode::Stream)
            .into_result(name);
        if result.succeeded() {
            report.pending("A reboot may be required for firmware updates to take effect");
        }
        report.record(result);
    }

    fn tmux_plugins(&self, name: &str, tpm: &TpmInstall) -> StepResult {
        let Some(script) = &tpm.update_script else {
            return StepResult::failure(
                name,
                format!("TPM update script not found in {}", tpm.base.display()),
            );
        };

        // Start the server so TPM can read the configuration; no-op if running
        match self.sub_command(&CommandSpec::new("tmux").arg("start-server"), OutputMode::Capture) {
            Execution::Finished(_) => {}
            other => return other.into_result(name),
        }

        let update =
            CommandSpec::new("bash").args([script.display().to_string(), "all".to_string()]);
        self.sub_command(&update, OutputMode::Stream).into_result(name)
    }

    /// The upgrade script's exit code is reported, never treated as failure
    fn oh_my_zsh(&self, name: &str, script: &Path) -> StepResult {
        let upgrade = CommandSpec::new("zsh").arg(script.display().to_string());
        match self.sub_command(&upgrade, OutputMode::Stream) {
            Execution::Finished(output) => StepResult::success(
                name,
                format!("upgrade script exited with code {}", output.exit_code),
            ),
            other => other.into_result(name),
        }
    }
}
