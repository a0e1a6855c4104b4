//! Clock
//!
//! Explicit time dependency for aggregate operations. Events carry
//! `occurred_on` timestamps; injecting the clock keeps replay and tests
//! deterministic instead of relying on ambient wall-clock state.

use chrono::{DateTime, Utc};

/// Source of "now" for event timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a fixed instant, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
