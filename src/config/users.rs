//! Admin user configuration loaded from environment variables.
//!
//! `ADMIN_USER_IDS` holds a comma-separated list of Discord user IDs allowed to run
//! admin commands. Everyone else is treated as an employee.

use std::collections::HashSet;

/// Parses a comma-separated list of user IDs, ignoring blanks and surrounding spaces.
#[must_use]
pub fn parse_admin_ids(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Reads the admin set from `ADMIN_USER_IDS`. Missing variable means no admins.
#[must_use]
pub fn get_admin_ids() -> HashSet<String> {
    std::env::var("ADMIN_USER_IDS")
        .map(|raw| parse_admin_ids(&raw))
        .unwrap_or_default()
}
