//! Append-only sample log.
//!
//! One header row, then one row per emitted tick. Each row is flushed before
//! `append` returns so a reader tailing the file sees every tick as it lands.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::rate::TickReport;

pub const FIELDS: [&str; 5] = [
    "timestamp",
    "throughput",
    "total_bytes",
    "packets_delta",
    "total_packets",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Csv,
    Jsonl,
}

impl LogFormat {
    pub fn display_name(self) -> &'static str {
        match self {
            LogFormat::Csv => "csv",
            LogFormat::Jsonl => "jsonl",
        }
    }
}

/// One log row. `throughput` is bytes per second, not bits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRecord {
    pub timestamp: String,
    pub throughput: f64,
    pub total_bytes: i64,
    pub packets_delta: i64,
    pub total_packets: i64,
}

impl From<&TickReport> for SampleRecord {
    fn from(report: &TickReport) -> Self {
        Self {
            timestamp: report
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Millis, false),
            throughput: report.bytes_per_sec,
            total_bytes: report.totals.total_bytes,
            packets_delta: report.packets_delta,
            total_packets: report.totals.total_packets,
        }
    }
}

pub struct SampleLog<W: Write> {
    writer: W,
    format: LogFormat,
}

impl SampleLog<BufWriter<File>> {
    /// Creates (or truncates) the log file and writes the header row.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn create(path: &Path, format: LogFormat) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        Self::new(BufWriter::new(file), format)
            .with_context(|| format!("Failed to write log header to {}", path.display()))
    }
}

impl<W: Write> SampleLog<W> {
    /// Wraps a writer and emits the header row.
    ///
    /// # Errors
    /// Returns an error if the header cannot be written.
    pub fn new(writer: W, format: LogFormat) -> Result<Self> {
        let mut log = Self { writer, format };
        log.write_header()?;
        Ok(log)
    }

    fn write_header(&mut self) -> Result<()> {
        match self.format {
            LogFormat::Csv => writeln!(self.writer, "{}", FIELDS.join(","))?,
            LogFormat::Jsonl => {
                let header = serde_json::json!({ "fields": FIELDS });
                writeln!(self.writer, "{header}")?;
            }
        }
        self.writer.flush().context("Failed to flush sample log")
    }

    /// Appends one tick and flushes.
    ///
    /// # Errors
    /// Returns an error if the row cannot be written or flushed.
    pub fn append(&mut self, report: &TickReport) -> Result<()> {
        let record = SampleRecord::from(report);
        match self.format {
            LogFormat::Csv => writeln!(
                self.writer,
                "{},{},{},{},{}",
                record.timestamp,
                record.throughput,
                record.total_bytes,
                record.packets_delta,
                record.total_packets
            )
            .context("Failed to write sample log row")?,
            LogFormat::Jsonl => {
                let line =
                    serde_json::to_string(&record).context("Failed to serialize sample")?;
                writeln!(self.writer, "{line}").context("Failed to write sample log row")?;
            }
        }
        self.writer.flush().context("Failed to flush sample log")
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Duration;

    use chrono::{Local, TimeZone};

    use super::*;
    use crate::rate::{RateEngine, Sample};

    fn report() -> TickReport {
        let t0 = Local.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let t1 = Local.with_ymd_and_hms(2025, 3, 1, 12, 0, 2).unwrap();
        let mut engine = RateEngine::new(Duration::from_secs(2));
        engine.observe(Sample::new(t0, 10, 500));
        engine.observe(Sample::new(t1, 15, 1300)).unwrap()
    }

    #[test]
    fn test_csv_header_and_row() {
        let mut log = SampleLog::new(Vec::new(), LogFormat::Csv).unwrap();
        log.append(&report()).unwrap();

        let text = String::from_utf8(log.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "timestamp,throughput,total_bytes,packets_delta,total_packets");
        assert!(lines[1].starts_with("2025-03-01T12:00:02.000"));
        assert!(lines[1].ends_with(",400,800,5,5"));
    }

    #[test]
    fn test_jsonl_rows() {
        let mut log = SampleLog::new(Vec::new(), LogFormat::Jsonl).unwrap();
        log.append(&report()).unwrap();

        let text = String::from_utf8(log.into_inner()).unwrap();
        let mut lines = text.lines();
        let header: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert_eq!(header["fields"][1], "throughput");

        let row: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert_eq!(row["throughput"], 400.0);
        assert_eq!(row["total_bytes"], 800);
        assert_eq!(row["packets_delta"], 5);
        assert_eq!(row["total_packets"], 5);
    }

    #[test]
    fn test_create_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.csv");
        std::fs::write(&path, "stale\nrows\n").unwrap();

        let mut log = SampleLog::create(&path, LogFormat::Csv).unwrap();
        log.append(&report()).unwrap();

        // flushed without dropping the writer
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("stale"));
        assert_eq!(contents.lines().count(), 2);
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_an_error() {
        assert!(SampleLog::new(FailingWriter, LogFormat::Csv).is_err());
    }
}
