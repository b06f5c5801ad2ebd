//! Common test utilities for updater integration tests

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// Isolated home directory for one invocation
pub struct TestHome {
    #[allow(dead_code)]
    pub temp: TempDir,
    pub path: PathBuf,
}

impl TestHome {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Compose directory inside the temporary home, as an absolute path
    #[allow(dead_code)]
    pub fn compose_dir(&self) -> String {
        self.path.join("docker").display().to_string()
    }

    /// Updater command running against this home
    #[allow(deprecated)]
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("system-updater").expect("binary should be built");
        cmd.env("HOME", &self.path).env("NO_COLOR", "1");
        cmd
    }
}

/// Every flag that turns a step off, so a dry run touches nothing
#[allow(dead_code)]
pub const ALL_SKIP_FLAGS: &[&str] = &[
    "--skip-system",
    "--skip-snap",
    "--skip-flatpak",
    "--skip-firmware",
    "--skip-pip",
    "--skip-mac-apps",
    "--skip-homebrew",
    "--skip-vim",
    "--skip-tmux",
    "--skip-omz",
    "--skip-docker-pull",
    "--skip-docker-prune",
];
