//! CLI definitions using clap derive API
//!
//! The updater is flag driven: running it without a subcommand performs the
//! maintenance run. The only subcommand generates shell completions.

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod completions;

pub use completions::CompletionsArgs;

/// Default compose directory, relative to the home directory
pub const DEFAULT_COMPOSE_DIR: &str = "docker";

/// System updater - cross-platform maintenance runner
///
/// Detects the operating system and runs the matching package manager,
/// firmware and container maintenance commands.
#[derive(Parser, Debug)]
#[command(
    name = "system-updater",
    author,
    version,
    color = clap::ColorChoice::Auto,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Cross-platform system update script for Linux/macOS with Docker maintenance",
    long_about = "Runs system package upgrades, snap, Flatpak, firmware, language package \
                  managers and docker compose refreshes for the detected platform. \
                  Every step is independent: one broken package manager never blocks the others.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  system-updater                                  \x1b[90m# Update everything, answering routine prompts\x1b[0m\n   \
                  system-updater -i                               \x1b[90m# Ask before each routine action\x1b[0m\n   \
                  system-updater --skip-docker-pull --skip-docker-prune\n   \
                  system-updater --dry-run                        \x1b[90m# Show what would run\x1b[0m\n   \
                  system-updater completions zsh                  \x1b[90m# Print zsh completions\x1b[0m\n\n\
                  Service restarts and reboots are always confirmed interactively.\n"
)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Interactive mode - prompt for routine actions (default is auto-yes)
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Skip operating system package updates
    #[arg(long, alias = "skip-os-updates")]
    pub skip_system: bool,

    /// Skip snap refresh (Linux only)
    #[arg(long)]
    pub skip_snap: bool,

    /// Skip Flatpak updates (Linux only)
    #[arg(long)]
    pub skip_flatpak: bool,

    /// Skip firmware updates (Linux only)
    #[arg(long)]
    pub skip_firmware: bool,

    /// Apply detected firmware updates without asking, even with -i
    #[arg(long)]
    pub apply_firmware: bool,

    /// Skip pip, gem and npm package updates
    #[arg(long)]
    pub skip_pip: bool,

    /// Skip Mac App Store and MacUpdater updates (macOS only)
    #[arg(long)]
    pub skip_mac_apps: bool,

    /// Enable MacUpdater for Mac application updates (macOS only)
    #[arg(long)]
    pub macupdater: bool,

    /// Skip Homebrew updates (macOS only)
    #[arg(long)]
    pub skip_homebrew: bool,

    /// Skip Vim plugin updates
    #[arg(long)]
    pub skip_vim: bool,

    /// Skip tmux plugin updates (TPM)
    #[arg(long)]
    pub skip_tmux: bool,

    /// Skip Oh My Zsh update
    #[arg(long)]
    pub skip_omz: bool,

    /// Skip docker compose pull
    #[arg(long)]
    pub skip_docker_pull: bool,

    /// Skip docker system prune
    #[arg(long)]
    pub skip_docker_prune: bool,

    /// Directory searched for compose manifests (relative to the home directory)
    #[arg(long, value_name = "DIR", default_value = DEFAULT_COMPOSE_DIR)]
    pub compose_dir: PathBuf,

    /// Show what would run without executing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,

    /// Enable verbose diagnostics on stderr
    #[arg(long, short = 'v')]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate shell completions
    Completions(CompletionsArgs),
}
