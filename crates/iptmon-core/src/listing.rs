//! Rule listing parser.
//!
//! Turns the text printed by `iptables -S <chain> -v` into counter records.
//! Only lines carrying a counter annotation (`-c <packets> <bytes>` or the
//! long `--set-counters` form) produce a record. Policy and chain header lines
//! (`-P INPUT ACCEPT`, `-N custom`) are skipped and do not consume a position.

use std::sync::LazyLock;

use regex::Regex;

static COUNTER_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)(?:-c|--set-counters)\s+(\d+)\s+(\d+)(?:\s|$)")
        .expect("counter annotation regex is valid")
});

/// One rule entry that carries packet/byte counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterRecord {
    /// 1-based rank among annotated lines.
    pub position: usize,
    /// The listing line exactly as printed.
    pub raw_line: String,
    pub packets: u64,
    pub bytes: u64,
}

/// Parses a full listing into counter records, in listing order.
///
/// Empty or unrecognised input yields an empty vector.
pub fn parse_listing(text: &str) -> Vec<CounterRecord> {
    text.lines()
        .filter_map(parse_counters)
        .enumerate()
        .map(|(idx, (line, packets, bytes))| CounterRecord {
            position: idx + 1,
            raw_line: line.to_string(),
            packets,
            bytes,
        })
        .collect()
}

/// Extracts `(line, packets, bytes)` from a single line.
///
/// Counters too large for `u64` make the line unparsable.
fn parse_counters(line: &str) -> Option<(&str, u64, u64)> {
    let caps = COUNTER_ANNOTATION.captures(line)?;
    let packets = caps.get(1)?.as_str().parse().ok()?;
    let bytes = caps.get(2)?.as_str().parse().ok()?;
    Some((line, packets, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
-P INPUT ACCEPT -c 120 9000
-A INPUT -s 10.0.0.0/8 -c 10 500 -j ACCEPT
-A INPUT -p tcp -m tcp --dport 22 -j ACCEPT
-A INPUT -i lo -c 0 0 -j ACCEPT
-A INPUT -p udp --set-counters 7 1400 -j DROP
";

    #[test]
    fn test_positions_are_dense_over_annotated_lines() {
        let records = parse_listing(LISTING);

        assert_eq!(records.len(), 4);
        let positions: Vec<usize> = records.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4]);
        assert_eq!(records[1].raw_line, "-A INPUT -s 10.0.0.0/8 -c 10 500 -j ACCEPT");
        assert_eq!((records[1].packets, records[1].bytes), (10, 500));
        assert_eq!((records[3].packets, records[3].bytes), (7, 1400));
    }

    #[test]
    fn test_lines_without_counters_are_skipped() {
        let text = "-N LOGDROP\n-A LOGDROP -j DROP\n-A INPUT -c 3 180\n";
        let records = parse_listing(text);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].position, 1);
        assert_eq!(records[0].raw_line, "-A INPUT -c 3 180");
    }

    #[test]
    fn test_empty_and_garbage_input_yield_nothing() {
        assert!(parse_listing("").is_empty());
        assert!(parse_listing("iptables: No chain/target/match by that name.\n").is_empty());
        assert!(parse_listing("-A INPUT -c ten 500\n").is_empty());
        assert!(parse_listing("-A INPUT -c 10\n").is_empty());
    }

    #[test]
    fn test_flag_must_be_a_standalone_token() {
        assert!(parse_listing("-A INPUT --comment x-c 1 2\n").is_empty());
        assert!(parse_listing("-A INPUT -c 1 2x\n").is_empty());
    }

    #[test]
    fn test_counter_overflow_makes_line_unparsable() {
        let text = "-A INPUT -c 99999999999999999999999 1\n-A INPUT -c 1 2\n";
        let records = parse_listing(text);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].position, 1);
        assert_eq!(records[0].packets, 1);
    }

    #[test]
    fn test_parsing_is_idempotent() {
        assert_eq!(parse_listing(LISTING), parse_listing(LISTING));
    }

    #[test]
    fn test_handles_crlf_line_endings() {
        let records = parse_listing("-A INPUT -c 1 2\r\n-A INPUT -c 3 4\r\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].bytes, 4);
    }
}
