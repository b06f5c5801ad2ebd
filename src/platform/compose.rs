//! Compose manifest discovery
//!
//! Finds docker compose projects under the configured compose directory and
//! offers to create a starter manifest when there is none.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::RunConfiguration;
use crate::confirm::Prompter;
use crate::error::{Result, UpdaterError};

/// Manifest file names, in the order compose itself prefers them
pub const MANIFEST_NAMES: &[&str] = &[
    "compose.yaml",
    "compose.yml",
    "docker-compose.yaml",
    "docker-compose.yml",
];

/// How deep below the compose directory projects are searched
const MAX_SEARCH_DEPTH: usize = 3;

/// Directory names never descended into
const IGNORED_DIRS: &[&str] = &[".cache", "tmp", ".git", "node_modules"];

/// Container runtimes keep image layers here; their manifests are not projects
const OVERLAY_STORAGE: &str = ".local/share/containers/storage/overlay";

const STARTER_MANIFEST: &str = "\
# Created by system-updater. Add the services you want kept up to date:
#
# services:
#   web:
#     image: nginx:latest
services: {}
";

/// A directory holding a compose manifest
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ComposeProject {
    pub dir: PathBuf,
    pub manifest: PathBuf,
    /// Service names from the manifest; empty when it could not be parsed
    pub services: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ComposeManifest {
    #[serde(default)]
    services: Option<BTreeMap<String, serde_yaml::Value>>,
}

/// Resolve the configured compose directory against the home directory
pub fn resolve_compose_dir(home: Option<&Path>, configured: &Path) -> Result<PathBuf> {
    if configured.is_absolute() {
        return Ok(configured.to_path_buf());
    }
    home.map(|h| h.join(configured))
        .ok_or(UpdaterError::HomeDirUnavailable)
}

fn is_ignored(root: &Path, path: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    if relative.to_string_lossy().contains(OVERLAY_STORAGE) {
        return true;
    }
    relative.components().any(|c| {
        let name = c.as_os_str().to_string_lossy();
        IGNORED_DIRS.iter().any(|ignored| *ignored == name)
    })
}

/// Find compose projects below `root`
///
/// Each directory yields at most one project, using the preferred manifest
/// name when several exist.
pub fn discover_projects(root: &Path) -> Vec<ComposeProject> {
    if !root.is_dir() {
        tracing::debug!(root = %root.display(), "compose directory does not exist");
        return Vec::new();
    }

    let mut manifests: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();
    let walker = WalkDir::new(root)
        .max_depth(MAX_SEARCH_DEPTH)
        .into_iter()
        .filter_entry(|entry| !is_ignored(root, entry.path()));

    for entry in walker.filter_map(std::result::Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        let Some(rank) = MANIFEST_NAMES.iter().position(|m| *m == name) else {
            continue;
        };
        let Some(dir) = entry.path().parent() else {
            continue;
        };
        let better = manifests.get(dir).is_none_or(|existing| {
            let existing_name = existing.file_name().map(|n| n.to_string_lossy().into_owned());
            MANIFEST_NAMES
                .iter()
                .position(|m| Some(*m) == existing_name.as_deref())
                .is_none_or(|existing_rank| rank < existing_rank)
        });
        if better {
            manifests.insert(dir.to_path_buf(), entry.path().to_path_buf());
        }
    }

    manifests
        .into_iter()
        .map(|(dir, manifest)| {
            let services = service_names(&manifest).unwrap_or_else(|e| {
                tracing::warn!(
                    manifest = %manifest.display(),
                    error = %e,
                    "could not parse compose manifest"
                );
                Vec::new()
            });
            ComposeProject {
                dir,
                manifest,
                services,
            }
        })
        .collect()
}

/// Service names declared in a compose manifest
pub fn service_names(manifest: &Path) -> Result<Vec<String>> {
    let invalid = |reason: String| UpdaterError::ComposeManifestInvalid {
        path: manifest.display().to_string(),
        reason,
    };
    let content = std::fs::read_to_string(manifest).map_err(|e| invalid(e.to_string()))?;
    let parsed: ComposeManifest =
        serde_yaml::from_str(&content).map_err(|e| invalid(e.to_string()))?;
    Ok(parsed
        .services
        .map(|services| services.into_keys().collect())
        .unwrap_or_default())
}

/// Write a starter manifest into `dir`, creating the directory if needed
pub fn create_starter_manifest(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(MANIFEST_NAMES[0]);
    let write_failed = |e: std::io::Error| UpdaterError::FileWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    };
    std::fs::create_dir_all(dir).map_err(write_failed)?;
    std::fs::write(&path, STARTER_MANIFEST).map_err(write_failed)?;
    Ok(path)
}

/// Offer once to create a manifest when none was found
///
/// Only interactive, non-dry runs that will pull images ask; auto mode
/// skips the offer entirely.
pub fn offer_starter_manifest(
    compose_dir: &Path,
    config: &RunConfiguration,
    prompter: &dyn Prompter,
) -> Result<Option<ComposeProject>> {
    if config.auto_confirm || config.dry_run || config.skip_docker_pull {
        return Ok(None);
    }

    let question = format!(
        "No compose manifest found in {}. Create a starter compose.yaml there?",
        compose_dir.display()
    );
    let accepted = prompter.ask(&question).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "compose manifest offer could not be shown");
        false
    });
    if !accepted {
        return Ok(None);
    }

    let manifest = create_starter_manifest(compose_dir)?;
    println!("✅ Created {}", manifest.display());
    Ok(Some(ComposeProject {
        dir: compose_dir.to_path_buf(),
        manifest,
        services: Vec::new(),
    }))
}
