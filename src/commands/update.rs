//! Maintenance run
//!
//! Resolves the platform profile, builds the step list and executes it,
//! then renders the summary. Dry runs swap in a runner and prompter that
//! only report what would happen.

use crate::config::RunConfiguration;
use crate::confirm::{DryRunPrompter, InquirePrompter, Prompter};
use crate::orchestrator::{Orchestrator, Summary};
use crate::platform::{self, Probe, SystemProbe};
use crate::runner::{CommandRunner, DryRunRunner, SystemRunner};
use crate::ui;

/// Run every applicable step on this machine
pub fn run(config: &RunConfiguration) -> Summary {
    if config.dry_run {
        execute(config, &SystemProbe, &DryRunRunner, &DryRunPrompter)
    } else {
        execute(config, &SystemProbe, &SystemRunner, &InquirePrompter)
    }
}

/// Run with explicit collaborators
pub fn execute(
    config: &RunConfiguration,
    probe: &dyn Probe,
    runner: &dyn CommandRunner,
    prompter: &dyn Prompter,
) -> Summary {
    let profile = platform::resolve(probe, config, prompter);
    ui::run_header(config, &profile);

    let summary = Orchestrator::new(config, runner, prompter).run(&profile);
    ui::render_summary(&summary);
    tracing::debug!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        skipped = summary.skipped,
        "run finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::testing::ScriptedPrompter;
    use crate::platform::testing::FakeProbe;
    use crate::runner::testing::ScriptedRunner;
    use crate::step::Outcome;
    use tempfile::TempDir;

    #[test]
    fn test_execute_ubuntu_host() {
        let home = TempDir::new().unwrap();
        let probe = FakeProbe::linux("ID=ubuntu\n")
            .with_executables(&["apt", "docker"])
            .with_home(home.path());
        let runner = ScriptedRunner::new();
        let prompter = ScriptedPrompter::always_no();

        let summary = execute(&RunConfiguration::default(), &probe, &runner, &prompter);

        assert!(runner.ran("sudo apt update"));
        assert!(runner.ran("docker system prune -a -f"));
        assert!(summary.is_success());
        assert_eq!(summary.succeeded, 3);
    }

    #[test]
    fn test_execute_reports_failures_in_summary() {
        let home = TempDir::new().unwrap();
        let probe = FakeProbe::linux("ID=fedora\n")
            .with_executables(&["dnf"])
            .with_home(home.path());
        let runner = ScriptedRunner::new().respond("sudo dnf upgrade", 1, "");
        let summary = execute(
            &RunConfiguration::default(),
            &probe,
            &runner,
            &ScriptedPrompter::always_no(),
        );

        assert_eq!(summary.exit_code(), 1);
        assert_eq!(summary.failed_steps, vec!["Upgrade packages: failed with exit code 1"]);
    }

    #[test]
    fn test_execute_without_home_still_runs() {
        let probe = FakeProbe::linux("ID=ubuntu\n").with_executables(&["apt"]);
        let runner = ScriptedRunner::new();
        let summary = execute(
            &RunConfiguration::default(),
            &probe,
            &runner,
            &ScriptedPrompter::always_no(),
        );
        assert!(runner.ran("sudo apt upgrade -y"));
        assert!(summary.is_success());
    }

    #[test]
    fn test_failed_starter_manifest_does_not_stop_maintenance() {
        let home = TempDir::new().unwrap();
        std::fs::write(home.path().join("docker"), "").unwrap();
        let probe = FakeProbe::linux("ID=ubuntu\n")
            .with_executables(&["apt", "docker"])
            .with_home(home.path());
        let config = RunConfiguration {
            auto_confirm: false,
            ..RunConfiguration::default()
        };
        let runner = ScriptedRunner::new();
        let prompter = ScriptedPrompter::always_yes();

        let summary = execute(&config, &probe, &runner, &prompter);

        assert!(runner.ran("sudo apt update"));
        assert!(runner.ran("sudo apt upgrade"));
        assert!(runner.ran("docker system prune -a -f"));
        let compose = summary
            .results
            .iter()
            .find(|r| r.name == "Refresh compose projects")
            .unwrap();
        assert_eq!(compose.outcome, Outcome::Inapplicable);
        assert!(summary.is_success());
    }
}
