//! Diagnostics setup.
//!
//! The terminal belongs to the status display, so tracing output goes to
//! `<IPTMON_HOME>/logs/iptmon.log`. Verbosity comes from `IPTMON_LOG`
//! (an `EnvFilter` directive, default `info`).

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::paths;

pub const LOG_ENV: &str = "IPTMON_LOG";
const LOG_FILE: &str = "iptmon.log";

/// Installs the global subscriber writing to the default logs directory.
///
/// Returns the appender guard; keep it alive until exit so buffered lines
/// are flushed. Returns `None` (diagnostics disabled) when the directory
/// cannot be created or a subscriber is already installed.
pub fn init() -> Option<WorkerGuard> {
    init_in(&paths::logs_dir())
}

pub fn init_in(dir: &Path) -> Option<WorkerGuard> {
    fs::create_dir_all(dir).ok()?;

    let appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;

    Some(guard)
}
