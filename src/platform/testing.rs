//! In-memory host for tests

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::Probe;

/// Probe answering from fixed data
#[derive(Debug, Default)]
pub struct FakeProbe {
    os: String,
    os_release: Option<String>,
    executables: HashSet<String>,
    home: Option<PathBuf>,
    paths: HashSet<PathBuf>,
}

impl FakeProbe {
    pub fn new(os: &str) -> Self {
        Self {
            os: os.to_string(),
            ..Self::default()
        }
    }

    /// Linux host with the given `/etc/os-release` contents
    pub fn linux(os_release: &str) -> Self {
        Self {
            os_release: Some(os_release.to_string()),
            ..Self::new("linux")
        }
    }

    pub fn with_executables(mut self, names: &[&str]) -> Self {
        self.executables
            .extend(names.iter().map(|n| (*n).to_string()));
        self
    }

    pub fn with_home(mut self, home: &Path) -> Self {
        self.home = Some(home.to_path_buf());
        self
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.paths.insert(path);
        self
    }
}

impl Probe for FakeProbe {
    fn os_name(&self) -> String {
        self.os.clone()
    }

    fn os_release(&self) -> Option<String> {
        self.os_release.clone()
    }

    fn has_executable(&self, name: &str) -> bool {
        self.executables.contains(name)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }

    fn exists(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }
}
