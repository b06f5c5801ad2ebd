//! Output heuristics
//!
//! Substring and line based inspection of captured tool output. Every
//! detector fails safe: output it does not recognise means "nothing to do",
//! never "restart" or "apply".

/// Markers printed only when a pull actually downloaded something
const UPDATE_MARKERS: &[&str] = &[
    "downloaded newer image",
    "pull complete",
    "download complete",
];

/// Markers `fwupdmgr get-updates` prints when nothing can be applied
const NO_FIRMWARE_MARKERS: &[&str] = &["no updates available", "no updatable devices"];

const NO_SOFTWARE_UPDATE_MARKER: &str = "No new software available";

/// Whether a compose pull fetched new images or layers
///
/// "Image is up to date" lines and service progress lines such as
/// `Pulling web ... done` carry no marker and yield `false`.
pub fn detect_updates(pull_output: &str) -> bool {
    let lowered = pull_output.to_lowercase();
    let found = UPDATE_MARKERS.iter().any(|m| lowered.contains(m));
    tracing::debug!(found, "scanned pull output for update markers");
    found
}

/// Unit names listed by `dnf needs-restarting -s`
///
/// Header and note lines (anything with spaces or ending in a colon) are
/// ignored so only names that can be passed to `systemctl` remain.
pub fn parse_restart_services(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| is_unit_name(line))
        .map(str::to_string)
        .collect()
}

fn is_unit_name(line: &str) -> bool {
    !line.is_empty()
        && !line.ends_with(':')
        && line
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '-' | ':' | '\\'))
}

/// Package names from `pip3 list --outdated --format=columns`
///
/// The first two lines are the column header and its underline.
pub fn parse_pip_outdated(output: &str) -> Vec<String> {
    output
        .trim()
        .lines()
        .skip(2)
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Whether `softwareupdate` reported that there is nothing to install
pub fn no_software_update(output: &str) -> bool {
    output.contains(NO_SOFTWARE_UPDATE_MARKER)
}

/// Whether installed software asks for a restart to complete
pub fn restart_requested(output: &str) -> bool {
    let lowered = output.to_lowercase();
    lowered.contains("restart") || lowered.contains("reboot")
}

/// Whether `fwupdmgr get-updates` listed applicable updates
pub fn firmware_updates_available(output: &str) -> bool {
    let lowered = output.to_lowercase();
    !output.trim().is_empty() && !NO_FIRMWARE_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Whether an "outdated" style listing contains any entries
pub fn has_entries(output: &str) -> bool {
    !output.trim().is_empty()
}
