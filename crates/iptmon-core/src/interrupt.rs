//! Signal handling for graceful shutdown.
//!
//! The sampling loop polls [`is_cancelled`] between ticks; nothing here
//! interrupts a tick in progress.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static TERMINATE: AtomicBool = AtomicBool::new(false);
static RESTORE_HOOK: OnceLock<Box<dyn Fn() + Send + Sync>> = OnceLock::new();

/// Installs the Ctrl+C handler and, on unix, SIGTERM/SIGHUP handlers.
///
/// Handlers only flip flags; the loop notices them between ticks.
///
/// # Errors
/// Returns an error if a handler cannot be registered.
pub fn init() -> Result<()> {
    ctrlc::set_handler(trigger_ctrl_c).context("Error setting Ctrl+C handler")?;

    #[cfg(unix)]
    {
        use signal_hook::consts::{SIGHUP, SIGTERM};

        // SAFETY: These closures only set an AtomicBool, which is async-signal-safe.
        unsafe {
            signal_hook::low_level::register(SIGTERM, || {
                TERMINATE.store(true, Ordering::SeqCst);
            })
            .context("Error registering SIGTERM handler")?;
            signal_hook::low_level::register(SIGHUP, || {
                TERMINATE.store(true, Ordering::SeqCst);
            })
            .context("Error registering SIGHUP handler")?;
        }
    }

    Ok(())
}

/// Triggers an interrupt via Ctrl+C, force-exiting on a second Ctrl+C.
pub fn trigger_ctrl_c() {
    if INTERRUPTED.swap(true, Ordering::SeqCst) {
        // process::exit() bypasses Drop, so restore the terminal here
        if let Some(hook) = RESTORE_HOOK.get() {
            hook();
        }
        std::process::exit(130);
    }
}

/// Checks if an interrupt has been requested.
pub fn is_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Checks if a terminate signal (SIGTERM/SIGHUP) was received.
pub fn should_terminate() -> bool {
    TERMINATE.load(Ordering::SeqCst)
}

/// True once the loop should stop for any reason.
pub fn is_cancelled() -> bool {
    is_interrupted() || should_terminate()
}

#[cfg(test)]
fn reset() {
    INTERRUPTED.store(false, Ordering::SeqCst);
}

/// Registers a restore hook called on the second Ctrl+C before exit.
pub fn set_restore_hook<F>(hook: F)
where
    F: Fn() + Send + Sync + 'static,
{
    let _ = RESTORE_HOOK.set(Box::new(hook));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_ctrl_c_sets_flag_only() {
        reset();
        assert!(!is_interrupted());

        trigger_ctrl_c();

        assert!(is_interrupted());
        assert!(is_cancelled());
        reset();
        assert!(!is_interrupted());
    }
}
