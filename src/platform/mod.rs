//! Platform profile
//!
//! This module handles:
//! - Operating system families and optional tools (OsFamily, Tool)
//! - The read-only profile of the current host (PlatformProfile)
//! - Host inspection (via the detection module)
//! - Compose manifest discovery (via the compose module)

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

pub mod compose;
pub mod detection;

#[cfg(test)]
pub mod testing;

pub use compose::ComposeProject;
pub use detection::{Probe, SystemProbe, resolve};

/// Detected operating system family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    /// Ubuntu, Debian and derivatives (apt)
    UbuntuLike,
    /// Fedora, RHEL, CentOS and derivatives (dnf or yum)
    FedoraLike,
    MacOs,
    Unknown,
}

impl OsFamily {
    pub fn is_linux(self) -> bool {
        matches!(self, OsFamily::UbuntuLike | OsFamily::FedoraLike)
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OsFamily::UbuntuLike => "ubuntu",
            OsFamily::FedoraLike => "fedora",
            OsFamily::MacOs => "macos",
            OsFamily::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// An external tool whose presence changes the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tool {
    Apt,
    Dnf,
    Yum,
    Softwareupdate,
    Snap,
    Flatpak,
    Fwupdmgr,
    Brew,
    Mas,
    Gem,
    Npm,
    Pip3,
    Docker,
    DockerCompose,
    Vim,
    Tmux,
    Zsh,
}

impl Tool {
    pub const ALL: [Tool; 17] = [
        Tool::Apt,
        Tool::Dnf,
        Tool::Yum,
        Tool::Softwareupdate,
        Tool::Snap,
        Tool::Flatpak,
        Tool::Fwupdmgr,
        Tool::Brew,
        Tool::Mas,
        Tool::Gem,
        Tool::Npm,
        Tool::Pip3,
        Tool::Docker,
        Tool::DockerCompose,
        Tool::Vim,
        Tool::Tmux,
        Tool::Zsh,
    ];

    /// Executable looked up on the search path
    pub fn executable(self) -> &'static str {
        match self {
            Tool::Apt => "apt",
            Tool::Dnf => "dnf",
            Tool::Yum => "yum",
            Tool::Softwareupdate => "softwareupdate",
            Tool::Snap => "snap",
            Tool::Flatpak => "flatpak",
            Tool::Fwupdmgr => "fwupdmgr",
            Tool::Brew => "brew",
            Tool::Mas => "mas",
            Tool::Gem => "gem",
            Tool::Npm => "npm",
            Tool::Pip3 => "pip3",
            Tool::Docker => "docker",
            Tool::DockerCompose => "docker-compose",
            Tool::Vim => "vim",
            Tool::Tmux => "tmux",
            Tool::Zsh => "zsh",
        }
    }
}

/// Tmux plugin manager installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TpmInstall {
    pub base: PathBuf,
    /// `update_plugins` script, if one of the known locations has it
    pub update_script: Option<PathBuf>,
}

/// Home-directory integrations found on the host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extras {
    pub vundle: bool,
    pub tpm: Option<TpmInstall>,
    pub oh_my_zsh_upgrade: Option<PathBuf>,
    pub macupdater_client: Option<PathBuf>,
}

/// Detected OS family and optional tool availability of the current host
///
/// Computed once by [`resolve`] and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformProfile {
    pub os: OsFamily,
    tools: BTreeSet<Tool>,
    /// Resolved directory searched for compose manifests
    pub compose_dir: Option<PathBuf>,
    pub compose_projects: Vec<ComposeProject>,
    pub extras: Extras,
}

impl PlatformProfile {
    pub fn new(os: OsFamily) -> Self {
        Self {
            os,
            tools: BTreeSet::new(),
            compose_dir: None,
            compose_projects: Vec::new(),
            extras: Extras::default(),
        }
    }

    #[must_use]
    pub fn with_tools(mut self, tools: impl IntoIterator<Item = Tool>) -> Self {
        self.tools.extend(tools);
        self
    }

    #[must_use]
    pub fn with_compose_dir(mut self, dir: PathBuf) -> Self {
        self.compose_dir = Some(dir);
        self
    }

    #[must_use]
    pub fn with_compose_projects(mut self, projects: Vec<ComposeProject>) -> Self {
        self.compose_projects = projects;
        self
    }

    #[must_use]
    pub fn with_extras(mut self, extras: Extras) -> Self {
        self.extras = extras;
        self
    }

    pub fn has(&self, tool: Tool) -> bool {
        self.tools.contains(&tool)
    }

    /// Whether any compose manifest was found
    pub fn compose_file_present(&self) -> bool {
        !self.compose_projects.is_empty()
    }

    /// Whether compose commands can run at all
    pub fn compose_available(&self) -> bool {
        self.has(Tool::DockerCompose) || self.has(Tool::Docker)
    }
}
