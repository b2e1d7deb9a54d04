//! Path resolution for iptmon configuration and diagnostics.
//!
//! IPTMON_HOME resolution order:
//! 1. IPTMON_HOME environment variable (if set)
//! 2. ~/.config/iptmon (default)
//! 3. ./.iptmon when no home directory can be determined

use std::path::PathBuf;

/// Returns the iptmon home directory.
pub fn iptmon_home() -> PathBuf {
    if let Ok(home) = std::env::var("IPTMON_HOME") {
        return PathBuf::from(home);
    }

    dirs::home_dir().map_or_else(
        || PathBuf::from(".iptmon"),
        |h| h.join(".config").join("iptmon"),
    )
}

/// Returns the path to the config.toml file.
pub fn config_path() -> PathBuf {
    iptmon_home().join("config.toml")
}

/// Returns the directory diagnostics are written to.
pub fn logs_dir() -> PathBuf {
    iptmon_home().join("logs")
}
