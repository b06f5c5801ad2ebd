//! System updater - cross-platform maintenance runner
//!
//! Detects the host operating system and runs the matching package manager,
//! firmware and container maintenance steps, one at a time, with a shared
//! confirmation policy and a tallied summary at the end.

use clap::Parser;

mod cli;
mod commands;
mod config;
mod confirm;
mod detect;
mod error;
mod logging;
mod orchestrator;
mod plan;
mod platform;
mod runner;
mod step;
mod ui;

use cli::{Cli, Commands};
use config::RunConfiguration;
use error::Result;

/// Run the requested command and return the process exit code
fn run(cli: &Cli) -> Result<i32> {
    if let Some(Commands::Completions(args)) = &cli.command {
        commands::completions::run(args)?;
        return Ok(0);
    }

    // Contradicting flags are rejected before anything touches the system
    let config = RunConfiguration::from(cli);
    config.validate()?;

    if cli.print_config {
        commands::print_config::run(&config)?;
        return Ok(0);
    }

    Ok(commands::update::run(&config).exit_code())
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            let code = e.exit_code();
            eprintln!("{:?}", miette::Report::new(e));
            code
        }
    };
    std::process::exit(code);
}
