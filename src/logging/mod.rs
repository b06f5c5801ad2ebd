//! Diagnostic logging
//!
//! Diagnostics go to stderr through `tracing`; progress for the operator
//! stays on stdout in the `ui` module. The level comes only from the
//! `--verbose` flag.

use tracing_subscriber::EnvFilter;

fn directive(verbose: bool) -> &'static str {
    if verbose { "system_updater=debug,warn" } else { "warn" }
}

/// Install the global subscriber; later calls are ignored
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive(verbose)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
