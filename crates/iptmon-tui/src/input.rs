//! Keyboard input: abort detection while waiting for the next tick.

use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Source of terminal events.
pub trait InputSource {
    /// Waits up to `timeout` for one event. `None` means the timeout elapsed.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be read.
    fn next_event(&mut self, timeout: Duration) -> Result<Option<Event>>;
}

/// Reads events from the real terminal.
#[derive(Debug, Default)]
pub struct CrosstermInput;

impl InputSource for CrosstermInput {
    fn next_event(&mut self, timeout: Duration) -> Result<Option<Event>> {
        if event::poll(timeout).context("Failed to poll terminal events")? {
            let event = event::read().context("Failed to read terminal event")?;
            Ok(Some(event))
        } else {
            Ok(None)
        }
    }
}

/// `q`, `Esc` and `Ctrl+C` quit. Raw mode turns Ctrl+C into a key event.
pub fn is_abort_key(key: &KeyEvent) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    match key.code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}
