//! Error types and handling for the updater
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! Only problems that stop the run before or outside a step live here.
//! A failing package manager is never an error: it becomes a failed
//! [`StepResult`](crate::step::StepResult) and the run continues.

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for updater operations
#[derive(Error, Diagnostic, Debug)]
pub enum UpdaterError {
    // Configuration errors
    #[error("Invalid configuration: {message}")]
    #[diagnostic(
        code(updater::config::invalid),
        help("Run 'system-updater --help' to see which flags can be combined")
    )]
    ConfigInvalid { message: String },

    #[error("Could not determine the home directory")]
    #[diagnostic(
        code(updater::config::home_unavailable),
        help("Pass an absolute path with --compose-dir")
    )]
    HomeDirUnavailable,

    // Process errors
    #[error("Failed to start '{command}': {reason}")]
    #[diagnostic(code(updater::process::spawn_failed))]
    CommandSpawnFailed { command: String, reason: String },

    // Prompt errors
    #[error("Failed to read confirmation: {message}")]
    #[diagnostic(
        code(updater::prompt::failed),
        help("Interactive prompts need a terminal; run without -i for unattended use")
    )]
    PromptFailed { message: String },

    // Compose errors
    #[error("Invalid compose manifest: {path}: {reason}")]
    #[diagnostic(code(updater::compose::invalid_manifest))]
    ComposeManifestInvalid { path: String, reason: String },

    // File system errors
    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(updater::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(updater::fs::io_error))]
    IoError { message: String },
}

impl UpdaterError {
    /// Process exit code used when this error ends the run
    pub fn exit_code(&self) -> i32 {
        match self {
            UpdaterError::ConfigInvalid { .. } | UpdaterError::HomeDirUnavailable => 2,
            _ => 1,
        }
    }
}

impl From<std::io::Error> for UpdaterError {
    fn from(err: std::io::Error) -> Self {
        UpdaterError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for UpdaterError {
    fn from(err: serde_json::Error) -> Self {
        UpdaterError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<inquire::InquireError> for UpdaterError {
    fn from(err: inquire::InquireError) -> Self {
        UpdaterError::PromptFailed {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, UpdaterError>;
