//! Host detection for building the platform profile
//!
//! All host inspection (OS identifiers, search-path lookups, home directory
//! files) goes through the [`Probe`] trait so resolution is deterministic
//! under test.

use std::path::{Path, PathBuf};

use crate::config::RunConfiguration;
use crate::confirm::Prompter;
use crate::ui;

use super::compose::{discover_projects, offer_starter_manifest, resolve_compose_dir};
use super::{Extras, OsFamily, PlatformProfile, Tool, TpmInstall};

const OS_RELEASE: &str = "/etc/os-release";

const MACUPDATER_CLIENT: &str = "/Applications/MacUpdater.app/Contents/Resources/macupdater_client";

/// Known locations of TPM's update script, relative to the TPM checkout
const TPM_SCRIPT_CANDIDATES: &[&str] = &[
    "bin/update_plugins",
    "update_plugins",
    "scripts/update_plugins",
];

/// Read-only view of the host
pub trait Probe {
    /// Platform identifier as in `std::env::consts::OS`
    fn os_name(&self) -> String;

    /// Contents of `/etc/os-release`, if readable
    fn os_release(&self) -> Option<String>;

    /// Whether `name` resolves on the executable search path
    fn has_executable(&self, name: &str) -> bool;

    fn home_dir(&self) -> Option<PathBuf>;

    fn exists(&self, path: &Path) -> bool;
}

/// Probe backed by the real machine
#[derive(Debug, Default)]
pub struct SystemProbe;

impl Probe for SystemProbe {
    fn os_name(&self) -> String {
        std::env::consts::OS.to_string()
    }

    fn os_release(&self) -> Option<String> {
        std::fs::read_to_string(OS_RELEASE).ok()
    }

    fn has_executable(&self, name: &str) -> bool {
        which::which(name).is_ok()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// `ID` and `ID_LIKE` values of an os-release file, lowercased
fn os_release_ids(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            line.strip_prefix("ID=")
                .or_else(|| line.strip_prefix("ID_LIKE="))
        })
        .flat_map(|value| {
            value
                .trim()
                .trim_matches(|c| c == '"' || c == '\'')
                .split_whitespace()
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
        })
        .collect()
}

fn linux_family(probe: &dyn Probe) -> OsFamily {
    if let Some(content) = probe.os_release() {
        let ids = os_release_ids(&content);
        let any = |names: &[&str]| ids.iter().any(|id| names.contains(&id.as_str()));
        if any(&["ubuntu", "debian"]) {
            return OsFamily::UbuntuLike;
        }
        if any(&["fedora", "rhel", "centos"]) {
            return OsFamily::FedoraLike;
        }
    }

    // Fall back to the package managers themselves
    if probe.has_executable(Tool::Apt.executable()) {
        OsFamily::UbuntuLike
    } else if probe.has_executable(Tool::Dnf.executable())
        || probe.has_executable(Tool::Yum.executable())
    {
        OsFamily::FedoraLike
    } else {
        OsFamily::Unknown
    }
}

/// Determine the OS family of the host
pub fn detect_os_family(probe: &dyn Probe) -> OsFamily {
    match probe.os_name().as_str() {
        "macos" => OsFamily::MacOs,
        "linux" => linux_family(probe),
        _ => OsFamily::Unknown,
    }
}

fn detect_extras(probe: &dyn Probe, os: OsFamily, home: Option<&Path>) -> Extras {
    let mut extras = Extras::default();

    if os == OsFamily::MacOs {
        let client = PathBuf::from(MACUPDATER_CLIENT);
        if probe.exists(&client) {
            extras.macupdater_client = Some(client);
        }
    }

    let Some(home) = home else {
        return extras;
    };

    extras.vundle = probe.exists(&home.join(".vim/bundle/Vundle.vim"));

    let tpm_base = home.join(".tmux/plugins/tpm");
    if probe.exists(&tpm_base) {
        let update_script = TPM_SCRIPT_CANDIDATES
            .iter()
            .map(|candidate| tpm_base.join(candidate))
            .find(|path| probe.exists(path));
        extras.tpm = Some(TpmInstall {
            base: tpm_base,
            update_script,
        });
    }

    let omz_upgrade = home.join(".oh-my-zsh/tools/upgrade.sh");
    if probe.exists(&omz_upgrade) {
        extras.oh_my_zsh_upgrade = Some(omz_upgrade);
    }

    extras
}

/// Build the profile of the current host
///
/// Absent tools are recorded, never reported as errors. When no compose
/// manifest exists, interactive runs are offered once to create one.
pub fn resolve(
    probe: &dyn Probe,
    config: &RunConfiguration,
    prompter: &dyn Prompter,
) -> PlatformProfile {
    let os = detect_os_family(probe);
    let tools: Vec<Tool> = Tool::ALL
        .into_iter()
        .filter(|tool| probe.has_executable(tool.executable()))
        .collect();
    tracing::debug!(%os, ?tools, "detected platform");

    let home = probe.home_dir();
    let extras = detect_extras(probe, os, home.as_deref());
    let mut profile = PlatformProfile::new(os)
        .with_tools(tools)
        .with_extras(extras);

    let compose_dir = match resolve_compose_dir(home.as_deref(), &config.compose_dir) {
        Ok(dir) => dir,
        Err(e) => {
            tracing::warn!(error = %e, "compose directory unavailable");
            return profile;
        }
    };

    let mut projects = discover_projects(&compose_dir);
    if projects.is_empty() && profile.compose_available() {
        match offer_starter_manifest(&compose_dir, config, prompter) {
            Ok(Some(project)) => projects.push(project),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "starter compose manifest not created");
                ui::warn(&format!("Could not create a starter compose manifest: {e}"));
            }
        }
    }
    tracing::debug!(dir = %compose_dir.display(), count = projects.len(), "compose projects");

    profile
        .with_compose_dir(compose_dir)
        .with_compose_projects(projects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::testing::ScriptedPrompter;
    use crate::platform::testing::FakeProbe;
    use tempfile::TempDir;

    #[test]
    fn test_detect_ubuntu_from_os_release() {
        let probe = FakeProbe::linux("NAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\n");
        assert_eq!(detect_os_family(&probe), OsFamily::UbuntuLike);
    }

    #[test]
    fn test_detect_debian_derivative_via_id_like() {
        let probe = FakeProbe::linux("ID=linuxmint\nID_LIKE=\"ubuntu debian\"\n");
        assert_eq!(detect_os_family(&probe), OsFamily::UbuntuLike);
    }

    #[test]
    fn test_detect_fedora_and_rhel() {
        assert_eq!(
            detect_os_family(&FakeProbe::linux("ID=fedora\n")),
            OsFamily::FedoraLike
        );
        assert_eq!(
            detect_os_family(&FakeProbe::linux("ID=\"rocky\"\nID_LIKE=\"rhel centos fedora\"\n")),
            OsFamily::FedoraLike
        );
    }

    #[test]
    fn test_detect_falls_back_to_package_managers() {
        let probe = FakeProbe::linux("ID=customos\n").with_executables(&["dnf"]);
        assert_eq!(detect_os_family(&probe), OsFamily::FedoraLike);

        let probe = FakeProbe::new("linux").with_executables(&["apt"]);
        assert_eq!(detect_os_family(&probe), OsFamily::UbuntuLike);
    }

    #[test]
    fn test_detect_unknown_linux() {
        assert_eq!(
            detect_os_family(&FakeProbe::linux("ID=arch\n")),
            OsFamily::Unknown
        );
    }

    #[test]
    fn test_detect_macos_and_other() {
        let mac = FakeProbe::new("macos");
        assert_eq!(detect_os_family(&mac), OsFamily::MacOs);

        let windows = FakeProbe::new("windows");
        assert_eq!(detect_os_family(&windows), OsFamily::Unknown);
    }

    #[test]
    fn test_resolve_records_available_tools() {
        let probe = FakeProbe::linux("ID=ubuntu\n").with_executables(&["apt", "snap", "docker"]);
        let profile = resolve(
            &probe,
            &RunConfiguration::default(),
            &ScriptedPrompter::always_no(),
        );

        assert_eq!(profile.os, OsFamily::UbuntuLike);
        assert!(profile.has(Tool::Snap));
        assert!(profile.has(Tool::Docker));
        assert!(!profile.has(Tool::Flatpak));
        assert!(profile.compose_dir.is_none());
    }

    #[test]
    fn test_resolve_detects_home_integrations() {
        let home = PathBuf::from("/home/tester");
        let probe = FakeProbe::linux("ID=fedora\n")
            .with_home(&home)
            .with_path(home.join(".vim/bundle/Vundle.vim"))
            .with_path(home.join(".tmux/plugins/tpm"))
            .with_path(home.join(".tmux/plugins/tpm/bin/update_plugins"))
            .with_path(home.join(".oh-my-zsh/tools/upgrade.sh"));
        let profile = resolve(
            &probe,
            &RunConfiguration::default(),
            &ScriptedPrompter::always_no(),
        );

        assert!(profile.extras.vundle);
        let tpm = profile.extras.tpm.unwrap();
        assert_eq!(
            tpm.update_script,
            Some(home.join(".tmux/plugins/tpm/bin/update_plugins"))
        );
        assert!(profile.extras.oh_my_zsh_upgrade.is_some());
        assert_eq!(profile.compose_dir, Some(home.join("docker")));
    }

    #[test]
    fn test_resolve_tpm_without_script() {
        let home = PathBuf::from("/home/tester");
        let probe = FakeProbe::linux("ID=ubuntu\n")
            .with_home(&home)
            .with_path(home.join(".tmux/plugins/tpm"));
        let profile = resolve(
            &probe,
            &RunConfiguration::default(),
            &ScriptedPrompter::always_no(),
        );
        assert_eq!(profile.extras.tpm.unwrap().update_script, None);
    }

    #[test]
    fn test_resolve_finds_compose_projects() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("docker/media");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(project.join("compose.yaml"), "services:\n  app:\n    image: x\n").unwrap();

        let probe = FakeProbe::linux("ID=ubuntu\n")
            .with_executables(&["docker"])
            .with_home(temp.path());
        let profile = resolve(
            &probe,
            &RunConfiguration::default(),
            &ScriptedPrompter::always_no(),
        );

        assert!(profile.compose_file_present());
        assert_eq!(profile.compose_projects[0].dir, project);
    }

    #[test]
    fn test_resolve_offers_manifest_when_interactive() {
        let temp = TempDir::new().unwrap();
        let probe = FakeProbe::linux("ID=ubuntu\n")
            .with_executables(&["docker"])
            .with_home(temp.path());
        let prompter = ScriptedPrompter::always_yes();
        let config = RunConfiguration {
            auto_confirm: false,
            ..RunConfiguration::default()
        };

        let profile = resolve(&probe, &config, &prompter);
        assert_eq!(prompter.questions().len(), 1);
        assert!(profile.compose_file_present());
        assert!(temp.path().join("docker/compose.yaml").exists());
    }

    #[test]
    fn test_resolve_no_offer_without_docker() {
        let temp = TempDir::new().unwrap();
        let probe = FakeProbe::linux("ID=ubuntu\n").with_home(temp.path());
        let prompter = ScriptedPrompter::always_yes();
        let config = RunConfiguration {
            auto_confirm: false,
            ..RunConfiguration::default()
        };

        let profile = resolve(&probe, &config, &prompter);
        assert!(prompter.questions().is_empty());
        assert!(!profile.compose_file_present());
    }

    #[test]
    fn test_resolve_survives_failed_starter_manifest() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("docker"), "not a directory").unwrap();
        let probe = FakeProbe::linux("ID=ubuntu\n")
            .with_executables(&["apt", "docker"])
            .with_home(temp.path());
        let prompter = ScriptedPrompter::always_yes();
        let config = RunConfiguration {
            auto_confirm: false,
            ..RunConfiguration::default()
        };

        let profile = resolve(&probe, &config, &prompter);
        assert_eq!(prompter.questions().len(), 1);
        assert!(!profile.compose_file_present());
        assert!(profile.has(Tool::Apt));
    }

    #[test]
    fn test_os_release_ids() {
        let ids = os_release_ids("NAME=Pop\nID=pop\nID_LIKE=\"ubuntu debian\"\nVERSION_ID=22.04\n");
        assert_eq!(ids, vec!["pop", "ubuntu", "debian"]);
    }
}
