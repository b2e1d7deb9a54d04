//! Counter selection by rule position.
//!
//! Every call re-fetches the listing; nothing is cached between ticks.

use tracing::debug;

use crate::listing::{CounterRecord, parse_listing};
use crate::source::ListingSource;

pub struct CounterSelector<S> {
    source: S,
}

impl<S: ListingSource> CounterSelector<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetches and parses the listing.
    ///
    /// A failed fetch is reported as an empty listing ("no rules").
    pub fn records(&self) -> Vec<CounterRecord> {
        match self.source.fetch() {
            Ok(text) => parse_listing(&text),
            Err(err) => {
                debug!(error = %format!("{err:#}"), "listing fetch failed");
                Vec::new()
            }
        }
    }

    /// Returns the record at the 1-based `position`, or `None` when the
    /// position is outside the current listing.
    pub fn select(&self, position: usize) -> Option<CounterRecord> {
        if position == 0 {
            return None;
        }
        self.records().into_iter().nth(position - 1)
    }
}
