//! The sampling loop.
//!
//! One cooperative, single-threaded loop: select counters, fold them into the
//! [`RateEngine`], paint the status rows, append to the sample log, then wait
//! for the next tick. Cancellation is only observed between ticks.

use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{debug, info, warn};

use crate::rate::{RateEngine, RunningTotals, Sample, TickReport};
use crate::sample_log::SampleLog;
use crate::schedule::{Scheduler, TickPolicy};
use crate::selector::CounterSelector;
use crate::source::ListingSource;

/// Consecutive skipped ticks before a warning is logged.
const SKIP_WARN_STREAK: u64 = 5;

pub const ROW_HEADER: u16 = 0;
pub const ROW_RULE: u16 = 1;
pub const ROW_LOG: u16 = 2;
pub const ROW_THROUGHPUT: u16 = 4;
pub const ROW_TOTAL: u16 = 5;
pub const ROW_PACKETS: u16 = 6;
pub const ROW_HINT: u16 = 8;

const THROUGHPUT_LABEL: &str = "Throughput: ";
const TOTAL_LABEL: &str = "Total:      ";
const PACKETS_LABEL: &str = "Packets:    ";
/// Column where tick values start, right after the labels.
pub const VALUE_COL: u16 = THROUGHPUT_LABEL.len() as u16;

/// Display surface: positioned text, an explicit flush, and abort detection.
pub trait StatusSurface {
    /// Writes `text` at `row`/`col`, replacing whatever followed `col` on that row.
    ///
    /// # Errors
    /// Returns an error if the surface cannot be written.
    fn put(&mut self, row: u16, col: u16, text: &str) -> Result<()>;

    /// Makes everything written since the last flush visible.
    ///
    /// # Errors
    /// Returns an error if the surface cannot be flushed.
    fn flush(&mut self) -> Result<()>;

    /// Blocks for up to `timeout`. Returns `true` if the user asked to quit.
    ///
    /// # Errors
    /// Returns an error if input cannot be read.
    fn wait(&mut self, timeout: Duration) -> Result<bool>;
}

/// Static information painted once above the status rows.
#[derive(Debug, Clone)]
pub struct MonitorHeader {
    pub chain: String,
    pub position: usize,
    pub period: Duration,
    pub rule_line: String,
    pub log: Option<String>,
}

impl MonitorHeader {
    pub fn title(&self) -> String {
        format!(
            "Monitoring chain '{}', rule index {}, refresh rate {}s",
            self.chain,
            self.position,
            self.period.as_secs_f64()
        )
    }
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Selection failed; nothing changed.
    Skipped,
    /// First successful sample, stored as the baseline.
    Baseline,
    Reported(TickReport),
}

/// Totals at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub reported_ticks: u64,
    pub skipped_ticks: u64,
    pub totals: RunningTotals,
}

pub struct Monitor<S, D, W: Write> {
    selector: CounterSelector<S>,
    position: usize,
    engine: RateEngine,
    scheduler_policy: TickPolicy,
    surface: D,
    log: Option<SampleLog<W>>,
    summary: RunSummary,
    skip_streak: u64,
}

impl<S, D, W> Monitor<S, D, W>
where
    S: ListingSource,
    D: StatusSurface,
    W: Write,
{
    pub fn new(
        selector: CounterSelector<S>,
        position: usize,
        period: Duration,
        schedule: TickPolicy,
        surface: D,
        log: Option<SampleLog<W>>,
    ) -> Self {
        Self {
            selector,
            position,
            engine: RateEngine::new(period),
            scheduler_policy: schedule,
            surface,
            log,
            summary: RunSummary::default(),
            skip_streak: 0,
        }
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    /// Paints the header rows and the status labels.
    ///
    /// # Errors
    /// Returns an error if the surface cannot be written.
    pub fn draw_header(&mut self, header: &MonitorHeader) -> Result<()> {
        self.surface.put(ROW_HEADER, 0, &header.title())?;
        self.surface
            .put(ROW_RULE, 0, &format!("Rule: {}", header.rule_line))?;
        if let Some(log) = &header.log {
            self.surface.put(ROW_LOG, 0, &format!("Logging to: {log}"))?;
        }
        self.surface.put(ROW_THROUGHPUT, 0, THROUGHPUT_LABEL)?;
        self.surface.put(ROW_TOTAL, 0, TOTAL_LABEL)?;
        self.surface.put(ROW_PACKETS, 0, PACKETS_LABEL)?;
        self.surface
            .put(ROW_HINT, 0, "Press q, Esc or Ctrl+C to quit")?;
        self.surface.flush()
    }

    /// Runs one tick: sample, derive, display, log.
    ///
    /// # Errors
    /// Returns an error if the display or the sample log fails.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        let Some(record) = self.selector.select(self.position) else {
            self.summary.skipped_ticks += 1;
            self.skip_streak += 1;
            if self.skip_streak == SKIP_WARN_STREAK {
                warn!(
                    position = self.position,
                    streak = self.skip_streak,
                    "rule counters unavailable; still retrying"
                );
            } else {
                debug!(position = self.position, "tick skipped");
            }
            return Ok(TickOutcome::Skipped);
        };
        self.skip_streak = 0;

        let sample = Sample::from_record(Local::now(), &record);
        let Some(report) = self.engine.observe(sample) else {
            debug!(packets = sample.packets, bytes = sample.bytes, "baseline sample");
            return Ok(TickOutcome::Baseline);
        };

        self.render(&report)?;
        if let Some(log) = self.log.as_mut() {
            log.append(&report).context("Failed to append to sample log")?;
        }

        self.summary.reported_ticks += 1;
        self.summary.totals = report.totals;
        debug!(
            bytes_delta = report.bytes_delta,
            packets_delta = report.packets_delta,
            bits_per_sec = report.bits_per_sec,
            "tick"
        );
        Ok(TickOutcome::Reported(report))
    }

    fn render(&mut self, report: &TickReport) -> Result<()> {
        self.surface
            .put(ROW_THROUGHPUT, VALUE_COL, &report.throughput_display())?;
        self.surface.put(
            ROW_TOTAL,
            VALUE_COL,
            &format!(
                "{} ({} packets)",
                report.total_bytes_display(),
                report.totals.total_packets
            ),
        )?;
        self.surface
            .put(ROW_PACKETS, VALUE_COL, &report.packet_rate_display())?;
        self.surface.flush()
    }

    /// Ticks until `cancelled` returns true or the surface reports an abort.
    ///
    /// The first successful tick is the baseline; every wait uses the
    /// configured [`TickPolicy`].
    ///
    /// # Errors
    /// Returns the first display or sample log error; the loop stops there.
    pub fn run<C>(&mut self, cancelled: C) -> Result<RunSummary>
    where
        C: Fn() -> bool,
    {
        let scheduler = Scheduler::new(self.scheduler_policy, self.engine.period(), Instant::now());
        info!(
            position = self.position,
            period_secs = self.engine.period().as_secs_f64(),
            schedule = scheduler.policy().display_name(),
            "monitor started"
        );

        while !cancelled() {
            self.tick()?;

            let delay = scheduler.next_delay(Instant::now());
            if self.surface.wait(delay)? {
                debug!("abort requested from display");
                break;
            }
        }

        info!(
            reported = self.summary.reported_ticks,
            skipped = self.summary.skipped_ticks,
            total_bytes = self.summary.totals.total_bytes,
            "monitor stopped"
        );
        Ok(self.summary)
    }

    /// Ends the run, handing back the surface and releasing the sample log.
    pub fn finish(self) -> (D, RunSummary) {
        drop(self.log);
        (self.surface, self.summary)
    }
}
