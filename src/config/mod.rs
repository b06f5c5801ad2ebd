//! Run configuration
//!
//! [`RunConfiguration`] is built once from the parsed command line and then
//! only read. Every skip flag maps to a [`Capability`]; steps name the
//! capability they touch so the orchestrator can decide skips uniformly.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::error::{Result, UpdaterError};

/// An area of the system a step touches, used to honour skip flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    System,
    Snap,
    Flatpak,
    Firmware,
    Pip,
    MacApps,
    MacUpdater,
    Homebrew,
    Vim,
    Tmux,
    OhMyZsh,
    DockerPull,
    DockerPrune,
}

impl Capability {
    /// Flag that turns this capability off (or on, for opt-in capabilities)
    pub fn flag(self) -> &'static str {
        match self {
            Capability::System => "--skip-system",
            Capability::Snap => "--skip-snap",
            Capability::Flatpak => "--skip-flatpak",
            Capability::Firmware => "--skip-firmware",
            Capability::Pip => "--skip-pip",
            Capability::MacApps => "--skip-mac-apps",
            Capability::MacUpdater => "--macupdater",
            Capability::Homebrew => "--skip-homebrew",
            Capability::Vim => "--skip-vim",
            Capability::Tmux => "--skip-tmux",
            Capability::OhMyZsh => "--skip-omz",
            Capability::DockerPull => "--skip-docker-pull",
            Capability::DockerPrune => "--skip-docker-prune",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::System => "system packages",
            Capability::Snap => "snap",
            Capability::Flatpak => "flatpak",
            Capability::Firmware => "firmware",
            Capability::Pip => "language packages",
            Capability::MacApps => "mac apps",
            Capability::MacUpdater => "macupdater",
            Capability::Homebrew => "homebrew",
            Capability::Vim => "vim plugins",
            Capability::Tmux => "tmux plugins",
            Capability::OhMyZsh => "oh my zsh",
            Capability::DockerPull => "docker pull",
            Capability::DockerPrune => "docker prune",
        };
        f.write_str(name)
    }
}

/// Immutable set of recognised flags for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunConfiguration {
    pub auto_confirm: bool,
    pub skip_system: bool,
    pub skip_snap: bool,
    pub skip_flatpak: bool,
    pub skip_firmware: bool,
    pub apply_firmware: bool,
    pub skip_pip: bool,
    pub skip_mac_apps: bool,
    pub enable_mac_updater: bool,
    pub skip_homebrew: bool,
    pub skip_vim: bool,
    pub skip_tmux: bool,
    pub skip_omz: bool,
    pub skip_docker_pull: bool,
    pub skip_docker_prune: bool,
    pub compose_dir: PathBuf,
    pub dry_run: bool,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            auto_confirm: true,
            skip_system: false,
            skip_snap: false,
            skip_flatpak: false,
            skip_firmware: false,
            apply_firmware: false,
            skip_pip: false,
            skip_mac_apps: false,
            enable_mac_updater: false,
            skip_homebrew: false,
            skip_vim: false,
            skip_tmux: false,
            skip_omz: false,
            skip_docker_pull: false,
            skip_docker_prune: false,
            compose_dir: PathBuf::from(crate::cli::DEFAULT_COMPOSE_DIR),
            dry_run: false,
        }
    }
}

impl From<&Cli> for RunConfiguration {
    fn from(cli: &Cli) -> Self {
        Self {
            auto_confirm: !cli.interactive,
            skip_system: cli.skip_system,
            skip_snap: cli.skip_snap,
            skip_flatpak: cli.skip_flatpak,
            skip_firmware: cli.skip_firmware,
            apply_firmware: cli.apply_firmware,
            skip_pip: cli.skip_pip,
            skip_mac_apps: cli.skip_mac_apps,
            enable_mac_updater: cli.macupdater,
            skip_homebrew: cli.skip_homebrew,
            skip_vim: cli.skip_vim,
            skip_tmux: cli.skip_tmux,
            skip_omz: cli.skip_omz,
            skip_docker_pull: cli.skip_docker_pull,
            skip_docker_prune: cli.skip_docker_prune,
            compose_dir: cli.compose_dir.clone(),
            dry_run: cli.dry_run,
        }
    }
}

impl RunConfiguration {
    /// Reject flag combinations that contradict each other
    ///
    /// Runs before any step so a bad invocation never changes the system.
    pub fn validate(&self) -> Result<()> {
        if self.skip_mac_apps && self.enable_mac_updater {
            return Err(UpdaterError::ConfigInvalid {
                message: "--skip-mac-apps and --macupdater cannot be used together".to_string(),
            });
        }
        if self.skip_firmware && self.apply_firmware {
            return Err(UpdaterError::ConfigInvalid {
                message: "--skip-firmware and --apply-firmware cannot be used together"
                    .to_string(),
            });
        }
        if self.compose_dir.as_os_str().is_empty() {
            return Err(UpdaterError::ConfigInvalid {
                message: "--compose-dir must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Whether steps touching `capability` must be skipped
    pub fn skips(&self, capability: Capability) -> bool {
        match capability {
            Capability::System => self.skip_system,
            Capability::Snap => self.skip_snap,
            Capability::Flatpak => self.skip_flatpak,
            Capability::Firmware => self.skip_firmware,
            Capability::Pip => self.skip_pip,
            Capability::MacApps => self.skip_mac_apps,
            Capability::MacUpdater => self.skip_mac_apps || !self.enable_mac_updater,
            Capability::Homebrew => self.skip_homebrew,
            Capability::Vim => self.skip_vim,
            Capability::Tmux => self.skip_tmux,
            Capability::OhMyZsh => self.skip_omz,
            Capability::DockerPull => self.skip_docker_pull,
            Capability::DockerPrune => self.skip_docker_prune,
        }
    }

    /// Label printed in the run header
    pub fn mode_label(&self) -> &'static str {
        match (self.auto_confirm, self.dry_run) {
            (_, true) => "Dry run",
            (true, false) => "Auto-yes",
            (false, false) => "Interactive",
        }
    }
}
