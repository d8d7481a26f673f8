//! Layer 0: Time primitives
//!
//! Timestamp is unix seconds - the display/windowing unit for the whole
//! query surface. StreamClock keeps append times non-decreasing per
//! stream; chain ordering never depends on it (log position decides).

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Unix timestamp in whole seconds.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    pub fn now() -> Self {
        Self(now_secs())
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn saturating_sub(self, other: Timestamp) -> u64 {
        self.0.saturating_sub(other.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Per-stream append clock.
///
/// Guarantees the `created_at` of successive appends to one stream never
/// goes backward, even when the wall clock does or a writer supplies an
/// older explicit timestamp. Equal seconds are fine - records within the
/// same second are ordered by log position.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StreamClock {
    last: Timestamp,
}

impl StreamClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue an append timestamp from the wall clock.
    pub fn tick(&mut self) -> Timestamp {
        self.observe(Timestamp::now())
    }

    /// Issue an append timestamp from a writer-supplied wall time.
    ///
    /// Clamped up to the last issued value so per-stream ordering holds.
    pub fn observe(&mut self, at: Timestamp) -> Timestamp {
        let issued = at.max(self.last);
        self.last = issued;
        issued
    }

    pub fn last(&self) -> Timestamp {
        self.last
    }
}
