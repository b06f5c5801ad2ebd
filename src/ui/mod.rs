//! Terminal presentation layer
//!
//! Standard output is the progress interface of the updater:
//! - a banner per step (name and underlying command)
//! - a completion, failure or skip marker per step
//! - the pending actions and the tallied summary at the end
//!
//! Spinners and the reboot countdown use indicatif.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::config::RunConfiguration;
use crate::orchestrator::Summary;
use crate::platform::PlatformProfile;
use crate::runner::CommandSpec;

const RULE_WIDTH: usize = 50;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Spinner shown while a captured command runs
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style.tick_chars("-\\|/ "));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Bar counting down the seconds before a reboot
pub fn countdown_bar(seconds: u64) -> ProgressBar {
    let pb = ProgressBar::new(seconds);
    if let Ok(style) =
        ProgressStyle::default_bar().template("  [{bar:30.red/yellow}] {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

pub fn dry_run_line(spec: &CommandSpec) -> String {
    format!(
        "{} would run: {spec}",
        Style::new().yellow().bold().apply_to("[DRY RUN]")
    )
}

/// Header printed once before the first step
pub fn run_header(config: &RunConfiguration, profile: &PlatformProfile) {
    println!(
        "{}",
        Style::new()
            .bold()
            .apply_to("🚀 Starting system update process...")
    );
    println!("Mode: {}", config.mode_label());
    println!("Detected OS: {}", profile.os);
}

/// Banner announcing a step and its command
pub fn banner(name: &str, command: Option<&str>) {
    println!("\n{}", rule());
    println!("Running: {}", Style::new().bold().apply_to(name));
    if let Some(command) = command {
        println!("Command: {}", Style::new().cyan().apply_to(command));
    }
    println!("{}", rule());
}

/// One command of a multi-command step
pub fn sub_command(spec: &CommandSpec) {
    println!("{} {}", Style::new().cyan().apply_to("▶"), spec);
}

pub fn step_succeeded(name: &str, message: &str) {
    if message.is_empty() {
        println!("{} {name} completed successfully", Style::new().green().apply_to("✅"));
    } else {
        println!("{} {name}: {message}", Style::new().green().apply_to("✅"));
    }
}

pub fn step_failed(name: &str, message: &str) {
    println!(
        "{} {name} {}",
        Style::new().red().apply_to("❌"),
        Style::new().red().apply_to(message)
    );
}

pub fn step_skipped(name: &str, message: &str) {
    println!(
        "{} {name} {}",
        Style::new().dim().apply_to("⏭️ "),
        Style::new().dim().apply_to(format!("(skipped: {message})"))
    );
}

pub fn info(message: &str) {
    println!("ℹ️  {message}");
}

pub fn warn(message: &str) {
    println!("{} {message}", Style::new().yellow().apply_to("⚠️ "));
}

/// Captured output shown to the operator before a decision
pub fn listing(title: &str, body: &str) {
    println!("📋 {title}:");
    for line in body.lines().filter(|l| !l.trim().is_empty()) {
        println!("   {line}");
    }
}

/// Pending actions, failures and tallies
pub fn render_summary(summary: &Summary) {
    if !summary.pending_actions.is_empty() {
        println!("\n{}", rule());
        println!("{}", Style::new().bold().apply_to("🔔 PENDING ACTIONS"));
        println!("{}", rule());
        for action in &summary.pending_actions {
            println!("  - {action}");
        }
    }

    if !summary.failed_steps.is_empty() {
        println!("\n{}", rule());
        println!("{}", Style::new().bold().apply_to("🔧 ISSUES / FAILURES"));
        println!("{}", rule());
        for failure in &summary.failed_steps {
            println!("  - {}", Style::new().red().apply_to(failure));
        }
    }

    println!("\n{}", rule());
    println!("{}", Style::new().bold().apply_to("📊 SUMMARY"));
    println!("{}", rule());
    println!(
        "Tasks completed successfully: {}/{}",
        summary.succeeded,
        summary.succeeded + summary.failed
    );
    println!("Steps considered: {}", summary.total);
    println!("Succeeded: {}", Style::new().green().apply_to(summary.succeeded));
    println!("Failed: {}", Style::new().red().apply_to(summary.failed));
    println!("Skipped: {}", Style::new().dim().apply_to(summary.skipped));

    if summary.is_success() {
        println!("🎉 All tasks completed successfully!");
    } else {
        println!(
            "{} Some tasks failed. Check the 'ISSUES / FAILURES' list and the output above for details.",
            Style::new().yellow().apply_to("⚠️ ")
        );
    }
}
