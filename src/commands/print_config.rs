//! `--print-config` implementation

use crate::config::RunConfiguration;
use crate::error::Result;

/// Print the effective configuration as pretty JSON
pub fn run(config: &RunConfiguration) -> Result<()> {
    println!("{}", render(config)?);
    Ok(())
}

fn render(config: &RunConfiguration) -> Result<String> {
    Ok(serde_json::to_string_pretty(config)?)
}
