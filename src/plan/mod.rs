//! Step list composition
//!
//! The whole ordered step list is built once from the platform profile and
//! the run configuration. Everything platform specific is decided here;
//! execution treats every step the same way.

use crate::config::{Capability, RunConfiguration};
use crate::confirm::ActionKind;
use crate::platform::{OsFamily, PlatformProfile, Tool};
use crate::runner::CommandSpec;
use crate::step::{ComposeTool, Procedure, Step};

fn missing(tool: Tool) -> String {
    format!("{} is not installed", tool.executable())
}

fn requires(step: Step, profile: &PlatformProfile, tool: Tool) -> Step {
    step.when(profile.has(tool), missing(tool))
}

/// Build the ordered step list for this host and configuration
pub fn build_plan(profile: &PlatformProfile, config: &RunConfiguration) -> Vec<Step> {
    let mut steps = match profile.os {
        OsFamily::UbuntuLike => ubuntu_steps(profile, config),
        OsFamily::FedoraLike => fedora_steps(profile, config),
        OsFamily::MacOs => macos_steps(profile),
        OsFamily::Unknown => vec![Step::inapplicable(
            "Update system packages",
            Capability::System,
            "unsupported operating system",
        )],
    };

    if profile.os.is_linux() {
        steps.extend(linux_optional_steps(profile, config));
    }
    steps.extend(user_steps(profile));
    if profile.os == OsFamily::MacOs {
        steps.extend(macupdater_steps(profile));
    }
    if profile.os.is_linux() {
        steps.push(firmware_step(profile));
    }
    steps.extend(compose_steps(profile));
    steps.push(prune_step(profile));

    // Nothing may follow a reboot countdown
    if profile.os == OsFamily::FedoraLike {
        steps.push(reboot_step(profile));
    }

    tracing::debug!(os = %profile.os, count = steps.len(), "built step list");
    steps
}

fn ubuntu_steps(profile: &PlatformProfile, config: &RunConfiguration) -> Vec<Step> {
    vec![
        requires(
            Step::command(
                "Update package lists",
                Capability::System,
                CommandSpec::privileged("apt").arg("update"),
            ),
            profile,
            Tool::Apt,
        ),
        requires(
            Step::command(
                "Upgrade packages",
                Capability::System,
                CommandSpec::privileged("apt")
                    .arg("upgrade")
                    .arg_if(config.auto_confirm, "-y"),
            ),
            profile,
            Tool::Apt,
        ),
    ]
}

/// `dnf` when present, otherwise `yum`
fn fedora_package_manager(profile: &PlatformProfile) -> Option<Tool> {
    [Tool::Dnf, Tool::Yum]
        .into_iter()
        .find(|tool| profile.has(*tool))
}

fn fedora_steps(profile: &PlatformProfile, config: &RunConfiguration) -> Vec<Step> {
    let Some(manager) = fedora_package_manager(profile) else {
        return vec![
            Step::inapplicable(
                "Upgrade packages",
                Capability::System,
                "neither dnf nor yum is installed",
            ),
            Step::inapplicable(
                "Restart services",
                Capability::System,
                "neither dnf nor yum is installed",
            ),
        ];
    };

    let verb = if manager == Tool::Dnf { "upgrade" } else { "update" };
    vec![
        Step::command(
            "Upgrade packages",
            Capability::System,
            CommandSpec::privileged(manager.executable())
                .arg(verb)
                .arg_if(config.auto_confirm, "-y"),
        ),
        Step::procedure(
            "Restart services",
            Capability::System,
            Procedure::ServiceRestarts {
                checker: restart_checker(manager),
            },
        ),
    ]
}

/// Command answering "what needs restarting" for the given package manager
fn restart_checker(manager: Tool) -> CommandSpec {
    match manager {
        Tool::Dnf => CommandSpec::new("dnf").arg("needs-restarting"),
        _ => CommandSpec::new("needs-restarting"),
    }
}

fn reboot_step(profile: &PlatformProfile) -> Step {
    match fedora_package_manager(profile) {
        Some(manager) => Step::procedure(
            "Check for required reboot",
            Capability::System,
            Procedure::RebootCheck {
                checker: restart_checker(manager),
            },
        ),
        None => Step::inapplicable(
            "Check for required reboot",
            Capability::System,
            "neither dnf nor yum is installed",
        ),
    }
}

fn macos_steps(profile: &PlatformProfile) -> Vec<Step> {
    let brew = |name: &str, args: &[&str]| {
        requires(
            Step::command(
                name,
                Capability::Homebrew,
                CommandSpec::new("brew").args(args.iter().copied()),
            ),
            profile,
            Tool::Brew,
        )
    };

    vec![
        requires(
            Step::procedure(
                "Install macOS software updates",
                Capability::System,
                Procedure::MacosSoftwareUpdate,
            ),
            profile,
            Tool::Softwareupdate,
        ),
        brew("Update Homebrew", &["update"]),
        brew("Upgrade Homebrew formulae", &["upgrade"]),
        brew("Upgrade Homebrew casks", &["upgrade", "--cask"]),
        brew("Remove unused Homebrew dependencies", &["autoremove"]),
        brew("Clean up Homebrew", &["cleanup"]),
        requires(
            Step::procedure(
                "Update Mac App Store apps",
                Capability::MacApps,
                Procedure::MasUpgrade,
            ),
            profile,
            Tool::Mas,
        ),
        requires(
            Step::procedure("Update user Ruby gems", Capability::Pip, Procedure::GemUpdate),
            profile,
            Tool::Gem,
        ),
        requires(
            Step::procedure(
                "Update global npm packages",
                Capability::Pip,
                Procedure::NpmGlobalUpdate,
            ),
            profile,
            Tool::Npm,
        ),
    ]
}

fn linux_optional_steps(profile: &PlatformProfile, config: &RunConfiguration) -> Vec<Step> {
    vec![
        requires(
            Step::command(
                "Refresh snap packages",
                Capability::Snap,
                CommandSpec::privileged("snap").arg("refresh"),
            ),
            profile,
            Tool::Snap,
        ),
        requires(
            Step::command(
                "Update Flatpak appstream data",
                Capability::Flatpak,
                CommandSpec::new("flatpak").args(["update", "--appstream"]),
            ),
            profile,
            Tool::Flatpak,
        ),
        requires(
            Step::command(
                "Update Flatpak applications",
                Capability::Flatpak,
                CommandSpec::new("flatpak")
                    .arg("update")
                    .arg_if(config.auto_confirm, "-y"),
            ),
            profile,
            Tool::Flatpak,
        ),
    ]
}

/// Language packages and per-user tooling, on every platform
fn user_steps(profile: &PlatformProfile) -> Vec<Step> {
    let vim = requires(
        Step::command(
            "Update Vim plugins",
            Capability::Vim,
            CommandSpec::new("vim").args(["+PluginUpdate", "+qall"]),
        ),
        profile,
        Tool::Vim,
    )
    .when(profile.extras.vundle, "Vundle is not installed");

    let tmux = match &profile.extras.tpm {
        Some(tpm) => requires(
            Step::procedure(
                "Update tmux plugins",
                Capability::Tmux,
                Procedure::TmuxPlugins { tpm: tpm.clone() },
            ),
            profile,
            Tool::Tmux,
        ),
        None => Step::inapplicable(
            "Update tmux plugins",
            Capability::Tmux,
            "TPM is not installed",
        ),
    };

    let omz = match &profile.extras.oh_my_zsh_upgrade {
        Some(script) => requires(
            Step::procedure(
                "Update Oh My Zsh",
                Capability::OhMyZsh,
                Procedure::OhMyZsh {
                    script: script.clone(),
                },
            ),
            profile,
            Tool::Zsh,
        ),
        None => Step::inapplicable(
            "Update Oh My Zsh",
            Capability::OhMyZsh,
            "Oh My Zsh is not installed",
        ),
    };

    vec![
        requires(
            Step::procedure("Upgrade pip packages", Capability::Pip, Procedure::PipUpgrade),
            profile,
            Tool::Pip3,
        ),
        vim,
        tmux,
        omz,
    ]
}

fn macupdater_steps(profile: &PlatformProfile) -> Vec<Step> {
    let Some(client) = &profile.extras.macupdater_client else {
        return vec![Step::inapplicable(
            "Update Mac apps with MacUpdater",
            Capability::MacUpdater,
            "MacUpdater is not installed",
        )];
    };
    let client = client.display().to_string();
    vec![
        Step::command(
            "Scan for Mac app updates",
            Capability::MacUpdater,
            CommandSpec::new(client.clone()).arg("scan"),
        ),
        Step::command(
            "Update Mac apps with MacUpdater",
            Capability::MacUpdater,
            CommandSpec::new(client).arg("update"),
        ),
    ]
}

fn firmware_step(profile: &PlatformProfile) -> Step {
    requires(
        Step::procedure("Update firmware", Capability::Firmware, Procedure::FirmwareUpdate),
        profile,
        Tool::Fwupdmgr,
    )
}

fn compose_steps(profile: &PlatformProfile) -> Vec<Step> {
    const NAME: &str = "Refresh compose projects";

    let tool = if profile.has(Tool::DockerCompose) {
        ComposeTool::Standalone
    } else if profile.has(Tool::Docker) {
        ComposeTool::Plugin
    } else {
        return vec![Step::inapplicable(NAME, Capability::DockerPull, missing(Tool::Docker))];
    };

    if !profile.compose_file_present() {
        let reason = match &profile.compose_dir {
            Some(dir) => format!("no compose manifest in {}", dir.display()),
            None => "no compose directory".to_string(),
        };
        return vec![Step::inapplicable(NAME, Capability::DockerPull, reason)];
    }

    profile
        .compose_projects
        .iter()
        .map(|project| {
            let label = project
                .dir
                .file_name()
                .map_or_else(
                    || project.dir.display().to_string(),
                    |n| n.to_string_lossy().into_owned(),
                );
            let name = if project.services.is_empty() {
                format!("Refresh compose project {label}")
            } else {
                format!("Refresh compose project {label} ({})", project.services.join(", "))
            };
            Step::procedure(
                name,
                Capability::DockerPull,
                Procedure::ComposeRefresh {
                    project: project.clone(),
                    tool,
                },
            )
        })
        .collect()
}

fn prune_step(profile: &PlatformProfile) -> Step {
    // The gate replaces docker's own prompt, hence the unconditional -f
    requires(
        Step::command(
            "Prune unused Docker data",
            Capability::DockerPrune,
            CommandSpec::new("docker").args(["system", "prune", "-a", "-f"]),
        ),
        profile,
        Tool::Docker,
    )
    .gated(ActionKind::Routine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{ComposeProject, Extras, TpmInstall};
    use crate::step::{Action, Applicability};
    use std::path::PathBuf;

    fn names(steps: &[Step]) -> Vec<&str> {
        steps.iter().map(|s| s.name.as_str()).collect()
    }

    fn find<'a>(steps: &'a [Step], name: &str) -> &'a Step {
        steps
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("no step named {name}"))
    }

    fn command_line(step: &Step) -> String {
        match &step.action {
            Action::Command(spec) => spec.to_string(),
            Action::Procedure(p) => panic!("expected a command, got {p:?}"),
        }
    }

    fn project(dir: &str, services: &[&str]) -> ComposeProject {
        ComposeProject {
            dir: PathBuf::from(dir),
            manifest: PathBuf::from(dir).join("compose.yaml"),
            services: services.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn test_ubuntu_plan_order() {
        let profile = PlatformProfile::new(OsFamily::UbuntuLike)
            .with_tools([Tool::Apt, Tool::Snap, Tool::Flatpak, Tool::Fwupdmgr, Tool::Docker]);
        let steps = build_plan(&profile, &RunConfiguration::default());

        assert_eq!(
            names(&steps),
            vec![
                "Update package lists",
                "Upgrade packages",
                "Refresh snap packages",
                "Update Flatpak appstream data",
                "Update Flatpak applications",
                "Upgrade pip packages",
                "Update Vim plugins",
                "Update tmux plugins",
                "Update Oh My Zsh",
                "Update firmware",
                "Refresh compose projects",
                "Prune unused Docker data",
            ]
        );
        assert_eq!(
            command_line(find(&steps, "Upgrade packages")),
            "sudo apt upgrade -y"
        );
        assert!(find(&steps, "Refresh snap packages").applicable());
        assert!(find(&steps, "Update firmware").applicable());
    }

    #[test]
    fn test_interactive_mode_lets_tools_prompt() {
        let profile = PlatformProfile::new(OsFamily::UbuntuLike).with_tools([Tool::Apt]);
        let config = RunConfiguration {
            auto_confirm: false,
            ..RunConfiguration::default()
        };
        let steps = build_plan(&profile, &config);
        assert_eq!(command_line(find(&steps, "Upgrade packages")), "sudo apt upgrade");
    }

    #[test]
    fn test_missing_tools_are_inapplicable() {
        let profile = PlatformProfile::new(OsFamily::UbuntuLike).with_tools([Tool::Apt]);
        let steps = build_plan(&profile, &RunConfiguration::default());
        assert_eq!(
            find(&steps, "Refresh snap packages").applicability,
            Applicability::Inapplicable("snap is not installed".to_string())
        );
        assert!(!find(&steps, "Prune unused Docker data").applicable());
    }

    #[test]
    fn test_fedora_plan_restarts_after_upgrade_and_reboot_last() {
        let profile = PlatformProfile::new(OsFamily::FedoraLike).with_tools([Tool::Dnf]);
        let steps = build_plan(&profile, &RunConfiguration::default());

        assert_eq!(steps[0].name, "Upgrade packages");
        assert_eq!(command_line(&steps[0]), "sudo dnf upgrade -y");
        assert_eq!(steps[1].name, "Restart services");
        assert!(steps[1].requires_manual_confirmation());

        let last = steps.last().unwrap();
        assert_eq!(last.name, "Check for required reboot");
        assert!(last.requires_manual_confirmation());
        assert_eq!(last.action.describe(), "dnf needs-restarting -r");
    }

    #[test]
    fn test_fedora_falls_back_to_yum() {
        let profile = PlatformProfile::new(OsFamily::FedoraLike).with_tools([Tool::Yum]);
        let steps = build_plan(&profile, &RunConfiguration::default());
        assert_eq!(command_line(&steps[0]), "sudo yum update -y");
        assert_eq!(steps[1].action.describe(), "needs-restarting -s");
    }

    #[test]
    fn test_macos_plan() {
        let profile = PlatformProfile::new(OsFamily::MacOs).with_tools([
            Tool::Softwareupdate,
            Tool::Brew,
            Tool::Mas,
        ]);
        let steps = build_plan(&profile, &RunConfiguration::default());
        let names = names(&steps);

        assert_eq!(names[0], "Install macOS software updates");
        assert!(names.contains(&"Upgrade Homebrew casks"));
        assert!(names.contains(&"Update Mac App Store apps"));
        assert!(names.contains(&"Update Mac apps with MacUpdater"));
        assert!(!names.contains(&"Refresh snap packages"));
        assert!(!names.contains(&"Update firmware"));
        assert!(!names.contains(&"Check for required reboot"));
        assert_eq!(
            command_line(find(&steps, "Upgrade Homebrew casks")),
            "brew upgrade --cask"
        );
    }

    #[test]
    fn test_macupdater_steps_use_client() {
        let profile = PlatformProfile::new(OsFamily::MacOs).with_extras(Extras {
            macupdater_client: Some(PathBuf::from("/Applications/MacUpdater.app/client")),
            ..Extras::default()
        });
        let steps = build_plan(&profile, &RunConfiguration::default());
        assert_eq!(
            command_line(find(&steps, "Scan for Mac app updates")),
            "/Applications/MacUpdater.app/client scan"
        );
        assert_eq!(
            find(&steps, "Scan for Mac app updates").capability,
            Capability::MacUpdater
        );
    }

    #[test]
    fn test_unknown_os_keeps_cross_platform_steps() {
        let profile = PlatformProfile::new(OsFamily::Unknown).with_tools([Tool::Docker]);
        let steps = build_plan(&profile, &RunConfiguration::default());
        assert_eq!(
            steps[0].applicability,
            Applicability::Inapplicable("unsupported operating system".to_string())
        );
        assert!(find(&steps, "Prune unused Docker data").applicable());
    }

    #[test]
    fn test_user_tooling_requires_installation() {
        let home = PathBuf::from("/home/me");
        let profile = PlatformProfile::new(OsFamily::UbuntuLike)
            .with_tools([Tool::Vim, Tool::Tmux, Tool::Zsh])
            .with_extras(Extras {
                vundle: true,
                tpm: Some(TpmInstall {
                    base: home.join(".tmux/plugins/tpm"),
                    update_script: Some(home.join(".tmux/plugins/tpm/bin/update_plugins")),
                }),
                oh_my_zsh_upgrade: Some(home.join(".oh-my-zsh/tools/upgrade.sh")),
                macupdater_client: None,
            });
        let steps = build_plan(&profile, &RunConfiguration::default());
        assert!(find(&steps, "Update Vim plugins").applicable());
        assert!(find(&steps, "Update tmux plugins").applicable());
        assert!(find(&steps, "Update Oh My Zsh").applicable());

        let bare = PlatformProfile::new(OsFamily::UbuntuLike).with_tools([Tool::Vim]);
        let steps = build_plan(&bare, &RunConfiguration::default());
        assert_eq!(
            find(&steps, "Update Vim plugins").applicability,
            Applicability::Inapplicable("Vundle is not installed".to_string())
        );
    }

    #[test]
    fn test_compose_step_per_project() {
        let profile = PlatformProfile::new(OsFamily::UbuntuLike)
            .with_tools([Tool::Docker])
            .with_compose_projects(vec![
                project("/home/me/docker/media", &["jellyfin", "sonarr"]),
                project("/home/me/docker/web", &[]),
            ]);
        let steps = build_plan(&profile, &RunConfiguration::default());
        let compose: Vec<_> = steps
            .iter()
            .filter(|s| s.capability == Capability::DockerPull)
            .collect();

        assert_eq!(compose.len(), 2);
        assert_eq!(compose[0].name, "Refresh compose project media (jellyfin, sonarr)");
        assert_eq!(compose[1].name, "Refresh compose project web");
        assert_eq!(
            compose[0].action.describe(),
            "docker compose pull (in /home/me/docker/media)"
        );
    }

    #[test]
    fn test_compose_prefers_standalone_binary() {
        let profile = PlatformProfile::new(OsFamily::MacOs)
            .with_tools([Tool::Docker, Tool::DockerCompose])
            .with_compose_projects(vec![project("/srv/app", &[])]);
        let steps = build_plan(&profile, &RunConfiguration::default());
        let step = find(&steps, "Refresh compose project app");
        assert!(step.action.describe().starts_with("docker-compose pull"));
    }

    #[test]
    fn test_compose_without_manifest_is_inapplicable() {
        let profile = PlatformProfile::new(OsFamily::UbuntuLike)
            .with_tools([Tool::Docker])
            .with_compose_dir(PathBuf::from("/home/me/docker"));
        let steps = build_plan(&profile, &RunConfiguration::default());
        assert_eq!(
            find(&steps, "Refresh compose projects").applicability,
            Applicability::Inapplicable("no compose manifest in /home/me/docker".to_string())
        );
    }

    #[test]
    fn test_prune_is_gated() {
        let profile = PlatformProfile::new(OsFamily::UbuntuLike).with_tools([Tool::Docker]);
        let steps = build_plan(&profile, &RunConfiguration::default());
        let prune = find(&steps, "Prune unused Docker data");
        assert_eq!(prune.gate, Some(ActionKind::Routine));
        assert_eq!(command_line(prune), "docker system prune -a -f");
    }

    #[test]
    fn test_plan_is_deterministic() {
        let profile =
            PlatformProfile::new(OsFamily::FedoraLike).with_tools([Tool::Dnf, Tool::Docker]);
        let config = RunConfiguration::default();
        assert_eq!(build_plan(&profile, &config), build_plan(&profile, &config));
    }
}
