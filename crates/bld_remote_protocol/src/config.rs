//! Environment configuration shared by broker and gateway.

use crate::defaults;

/// Command broker TCP port.
pub const PORT_ENV: &str = "BLD_REMOTE_MCP_PORT";

/// When truthy, hosts start the broker at process init.
pub const START_NOW_ENV: &str = "BLD_REMOTE_MCP_START_NOW";

/// One of DEBUG, INFO, WARNING, ERROR, CRITICAL; default INFO.
pub const LOG_LEVEL_ENV: &str = "BLD_REMOTE_LOG_LEVEL";

/// Override for the application home directory (logs live beneath it).
pub const HOME_ENV: &str = "BLD_REMOTE_HOME";

/// Read the broker port from the environment, falling back to the default
/// when unset or unparseable.
pub fn port_from_env() -> u16 {
    std::env::var(PORT_ENV)
        .ok()
        .and_then(|raw| raw.trim().parse::<u16>().ok())
        .unwrap_or(defaults::DEFAULT_PORT)
}

/// Truthiness used for flag-style env vars: 1/true/yes/on, case-insensitive.
pub fn env_truthy(name: &str) -> bool {
    match std::env::var(name) {
        Ok(raw) => is_truthy(&raw),
        Err(_) => false,
    }
}

/// Whether the host should start the broker at process init.
pub fn start_now() -> bool {
    env_truthy(START_NOW_ENV)
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthy_values() {
        for yes in ["1", "true", "TRUE", "Yes", "on", " 1 "] {
            assert!(is_truthy(yes), "{yes:?} should be truthy");
        }
        for no in ["", "0", "false", "off", "no", "2", "enabled"] {
            assert!(!is_truthy(no), "{no:?} should be falsy");
        }
    }
}
