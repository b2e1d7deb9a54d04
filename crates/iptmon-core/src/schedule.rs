//! Inter-tick timing.
//!
//! `FixedDelay` sleeps the full period after each tick, so the real period
//! drifts by the listing round trip. `FixedRate` sleeps until the next
//! `anchor + k * period` boundary; an overrunning tick skips to the next
//! boundary after `now` instead of firing a burst of catch-up ticks.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TickPolicy {
    #[default]
    FixedDelay,
    FixedRate,
}

impl TickPolicy {
    pub fn display_name(self) -> &'static str {
        match self {
            TickPolicy::FixedDelay => "fixed-delay",
            TickPolicy::FixedRate => "fixed-rate",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    policy: TickPolicy,
    period: Duration,
    anchor: Instant,
}

impl Scheduler {
    pub fn new(policy: TickPolicy, period: Duration, anchor: Instant) -> Self {
        Self {
            policy,
            period,
            anchor,
        }
    }

    pub fn policy(&self) -> TickPolicy {
        self.policy
    }

    /// How long to wait, measured from `now`, before the next tick.
    pub fn next_delay(&self, now: Instant) -> Duration {
        match self.policy {
            TickPolicy::FixedDelay => self.period,
            TickPolicy::FixedRate => {
                let period = self.period.as_nanos().max(1);
                let elapsed = now.saturating_duration_since(self.anchor).as_nanos();
                let next_boundary = (elapsed / period + 1) * period;
                let wait = next_boundary - elapsed;
                Duration::from_nanos(u64::try_from(wait).unwrap_or(u64::MAX))
            }
        }
    }
}
