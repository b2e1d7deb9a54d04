//! Full-screen status display for iptmon.

pub mod input;
pub mod surface;
pub mod terminal;

use std::io::{IsTerminal, Write, stdout};

use anyhow::Result;
use iptmon_core::config::MonitorSettings;
use iptmon_core::interrupt;
use iptmon_core::monitor::{Monitor, MonitorHeader, RunSummary};
use iptmon_core::sample_log::SampleLog;
use iptmon_core::selector::CounterSelector;
use iptmon_core::source::ListingSource;

pub use crate::input::CrosstermInput;
pub use crate::surface::{StatusBoard, TerminalSurface};

/// Fails unless stdout is an interactive terminal.
///
/// # Errors
/// Returns an error when stdout is redirected or piped.
pub fn ensure_terminal() -> Result<()> {
    if !stdout().is_terminal() {
        anyhow::bail!(
            "The live display requires a terminal.\n\
             Use `iptmon --list` to print the chain's counters once."
        );
    }
    Ok(())
}

/// Takes over the terminal and runs the sampling loop until the user quits.
///
/// The terminal is restored before this returns, on success or error.
///
/// # Errors
/// Returns an error if stdout is not a terminal, the terminal cannot be set
/// up, or the loop fails.
pub fn run_status_display<S, W>(
    selector: CounterSelector<S>,
    settings: &MonitorSettings,
    header: &MonitorHeader,
    log: Option<SampleLog<W>>,
) -> Result<RunSummary>
where
    S: ListingSource,
    W: Write,
{
    ensure_terminal()?;

    terminal::install_panic_hook();
    interrupt::set_restore_hook(|| {
        let _ = terminal::restore_terminal();
    });

    let term = terminal::setup_terminal()?;
    let _guard = terminal::TerminalGuard;

    let surface = TerminalSurface::new(term, CrosstermInput);
    let mut monitor = Monitor::new(
        selector,
        settings.position,
        settings.period,
        settings.schedule,
        surface,
        log,
    );
    monitor.draw_header(header)?;
    let summary = monitor.run(interrupt::is_cancelled)?;
    monitor.finish();
    Ok(summary)
}
