//! Command implementations for the updater CLI

pub mod completions;
pub mod print_config;
pub mod update;
