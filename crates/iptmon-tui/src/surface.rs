//! ratatui-backed status surface.
//!
//! `put` edits an in-memory board of rows; `flush` redraws the board in one
//! frame. Waiting polls the terminal in short slices so SIGTERM is noticed
//! without waiting out a long refresh period.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use crossterm::event::Event;
use iptmon_core::interrupt;
use iptmon_core::monitor::StatusSurface;
use ratatui::backend::Backend;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};

use crate::input::{InputSource, is_abort_key};

const POLL_SLICE: Duration = Duration::from_millis(250);

/// Rows of text keyed by screen row.
#[derive(Debug, Default, Clone)]
pub struct StatusBoard {
    rows: BTreeMap<u16, String>,
}

impl StatusBoard {
    /// Replaces the row's text from `col` onward, padding with spaces.
    pub fn put(&mut self, row: u16, col: u16, text: &str) {
        let line = self.rows.entry(row).or_default();
        let col = usize::from(col);
        let mut kept: String = line.chars().take(col).collect();
        let width = kept.chars().count();
        if width < col {
            kept.extend(std::iter::repeat_n(' ', col - width));
        }
        kept.push_str(text);
        *line = kept;
    }

    fn row(&self, row: u16) -> Option<&str> {
        self.rows.get(&row).map(String::as_str)
    }

    fn lines(&self) -> Vec<Line<'_>> {
        let Some(last) = self.rows.keys().next_back().copied() else {
            return Vec::new();
        };
        (0..=last)
            .map(|row| Line::raw(self.row(row).unwrap_or("")))
            .collect()
    }

    /// Draws the board top-left aligned; rows past the bottom are clipped.
    pub fn render(&self, frame: &mut Frame) {
        frame.render_widget(Paragraph::new(self.lines()), frame.area());
    }
}

pub struct TerminalSurface<B: Backend, I> {
    terminal: Terminal<B>,
    input: I,
    board: StatusBoard,
}

impl<B: Backend, I: InputSource> TerminalSurface<B, I> {
    pub fn new(terminal: Terminal<B>, input: I) -> Self {
        Self {
            terminal,
            input,
            board: StatusBoard::default(),
        }
    }

    #[cfg(test)]
    fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    fn redraw(&mut self) -> Result<()> {
        let board = &self.board;
        self.terminal
            .draw(|frame| board.render(frame))
            .map_err(|e| anyhow!("Failed to draw status display: {e}"))?;
        Ok(())
    }
}

impl<B: Backend, I: InputSource> StatusSurface for TerminalSurface<B, I> {
    fn put(&mut self, row: u16, col: u16, text: &str) -> Result<()> {
        self.board.put(row, col, text);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.redraw()
    }

    fn wait(&mut self, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if interrupt::is_cancelled() {
                return Ok(true);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            match self.input.next_event(remaining.min(POLL_SLICE))? {
                Some(Event::Key(key)) if is_abort_key(&key) => return Ok(true),
                Some(Event::Resize(..)) => self.redraw()?,
                _ => {}
            }
        }
    }
}
