//! Rate engine: deltas, throughput and running totals across samples.
//!
//! Counter decreases (an out-of-band `iptables -Z`) are not special-cased.
//! The negative delta flows straight into the rate and the totals, so the
//! display can show a negative throughput and the totals can drop below zero.

use std::time::Duration;

use chrono::{DateTime, Local};

use crate::format::format_magnitude;
use crate::listing::CounterRecord;

/// One observation of the monitored rule's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub timestamp: DateTime<Local>,
    pub packets: u64,
    pub bytes: u64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Local>, packets: u64, bytes: u64) -> Self {
        Self {
            timestamp,
            packets,
            bytes,
        }
    }

    pub fn from_record(timestamp: DateTime<Local>, record: &CounterRecord) -> Self {
        Self::new(timestamp, record.packets, record.bytes)
    }
}

/// Signed accumulators; resets can drive them negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningTotals {
    pub total_bytes: i64,
    pub total_packets: i64,
}

/// Everything derived from one non-baseline tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub timestamp: DateTime<Local>,
    pub packets_delta: i64,
    pub bytes_delta: i64,
    /// `bytes_delta / T`, the value written to the sample log.
    pub bytes_per_sec: f64,
    /// `bytes_delta * 8 / T`, the value shown on screen.
    pub bits_per_sec: f64,
    pub packets_per_sec: f64,
    pub totals: RunningTotals,
}

impl TickReport {
    pub fn throughput_display(&self) -> String {
        format_magnitude(self.bits_per_sec, "bps")
    }

    pub fn total_bytes_display(&self) -> String {
        format_magnitude(self.totals.total_bytes as f64, "B")
    }

    pub fn packet_rate_display(&self) -> String {
        format_magnitude(self.packets_per_sec, "pps")
    }
}

#[derive(Debug)]
pub struct RateEngine {
    period: Duration,
    previous: Option<Sample>,
    totals: RunningTotals,
}

impl RateEngine {
    /// `period` is the configured refresh period; it must be non-zero.
    pub fn new(period: Duration) -> Self {
        debug_assert!(!period.is_zero(), "refresh period must be positive");
        Self {
            period,
            previous: None,
            totals: RunningTotals::default(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    #[cfg(test)]
    fn totals(&self) -> RunningTotals {
        self.totals
    }

    #[cfg(test)]
    fn has_baseline(&self) -> bool {
        self.previous.is_some()
    }

    /// Folds a new sample into the engine.
    ///
    /// The first sample only seeds the baseline and returns `None`.
    pub fn observe(&mut self, sample: Sample) -> Option<TickReport> {
        let previous = self.previous.replace(sample)?;

        let packets_delta = counter_delta(sample.packets, previous.packets);
        let bytes_delta = counter_delta(sample.bytes, previous.bytes);

        self.totals.total_bytes = self.totals.total_bytes.saturating_add(bytes_delta);
        self.totals.total_packets = self.totals.total_packets.saturating_add(packets_delta);

        let secs = self.period.as_secs_f64();
        let bytes_per_sec = bytes_delta as f64 / secs;

        Some(TickReport {
            timestamp: sample.timestamp,
            packets_delta,
            bytes_delta,
            bytes_per_sec,
            bits_per_sec: (bytes_delta as f64 * 8.0) / secs,
            packets_per_sec: packets_delta as f64 / secs,
            totals: self.totals,
        })
    }
}

fn counter_delta(current: u64, previous: u64) -> i64 {
    let delta = i128::from(current) - i128::from(previous);
    i64::try_from(delta).unwrap_or(if delta < 0 { i64::MIN } else { i64::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(packets: u64, bytes: u64) -> Sample {
        Sample::new(Local::now(), packets, bytes)
    }

    #[test]
    fn test_first_sample_is_baseline_only() {
        let mut engine = RateEngine::new(Duration::from_secs(1));

        assert!(!engine.has_baseline());
        assert!(engine.observe(sample(10, 500)).is_none());
        assert!(engine.has_baseline());
        assert_eq!(engine.totals(), RunningTotals::default());
    }

    #[test]
    fn test_two_second_period_scenario() {
        let mut engine = RateEngine::new(Duration::from_secs(2));
        engine.observe(sample(10, 500));

        let report = engine.observe(sample(15, 1300)).unwrap();

        assert_eq!(report.bytes_delta, 800);
        assert_eq!(report.packets_delta, 5);
        assert!((report.bits_per_sec - 3200.0).abs() < f64::EPSILON);
        assert!((report.bytes_per_sec - 400.0).abs() < f64::EPSILON);
        assert!((report.packets_per_sec - 2.5).abs() < f64::EPSILON);
        assert_eq!(report.throughput_display(), "3.13 Kbps");
        assert_eq!(report.total_bytes_display(), "800.00 B");
    }

    #[test]
    fn test_totals_accumulate_across_ticks() {
        let mut engine = RateEngine::new(Duration::from_secs(1));
        engine.observe(sample(0, 0));
        engine.observe(sample(4, 1000));
        let report = engine.observe(sample(6, 3048)).unwrap();

        assert_eq!(report.bytes_delta, 2048);
        assert_eq!(
            report.totals,
            RunningTotals {
                total_bytes: 3048,
                total_packets: 6,
            }
        );
        assert_eq!(report.total_bytes_display(), "2.98 KB");
    }

    #[test]
    fn test_counter_reset_passes_negative_delta_through() {
        let mut engine = RateEngine::new(Duration::from_secs(1));
        engine.observe(sample(10, 5000));
        engine.observe(sample(12, 6000));

        let report = engine.observe(sample(1, 100)).unwrap();

        assert_eq!(report.bytes_delta, -5900);
        assert_eq!(report.packets_delta, -11);
        assert!(report.bits_per_sec < 0.0);
        assert_eq!(report.totals.total_bytes, -4900);
        assert_eq!(report.totals.total_packets, -9);
        assert_eq!(report.total_bytes_display(), "-4.79 KB");
    }

    #[test]
    fn test_fractional_period() {
        let mut engine = RateEngine::new(Duration::from_millis(500));
        engine.observe(sample(0, 0));

        let report = engine.observe(sample(1, 128)).unwrap();

        assert!((report.bits_per_sec - 2048.0).abs() < f64::EPSILON);
        assert_eq!(report.throughput_display(), "2.00 Kbps");
    }

    #[test]
    fn test_delta_saturates_at_i64_bounds() {
        assert_eq!(counter_delta(u64::MAX, 0), i64::MAX);
        assert_eq!(counter_delta(0, u64::MAX), i64::MIN);
        assert_eq!(counter_delta(7, 10), -3);
    }
}
