//! Startup errors: caller mistakes detected before the sampling loop starts.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum StartupError {
    /// Refresh period is zero, negative, not finite or below 1ns.
    InvalidRefresh(f64),
    /// The chain listing carries no counter annotations.
    NoRules { chain: String },
    /// Position outside `1..=available`.
    InvalidPosition { position: i64, available: usize },
    /// The user declined to overwrite an existing log file.
    OverwriteDeclined(PathBuf),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::InvalidRefresh(secs) if secs.is_finite() && *secs > 0.0 => {
                write!(f, "Refresh interval must be at least 1ns (got {secs})")
            }
            StartupError::InvalidRefresh(secs) => {
                write!(f, "Refresh interval must be greater than zero (got {secs})")
            }
            StartupError::NoRules { chain } => write!(f, "No rules found in chain '{chain}'"),
            StartupError::InvalidPosition {
                position,
                available: 0,
            } => write!(f, "Rule number {position} is invalid. Must be 1 or greater"),
            StartupError::InvalidPosition {
                position,
                available,
            } => write!(
                f,
                "Rule number {position} is invalid. Must be between 1 and {available}"
            ),
            StartupError::OverwriteDeclined(path) => {
                write!(f, "Not overwriting existing log file {}", path.display())
            }
        }
    }
}

impl std::error::Error for StartupError {}
