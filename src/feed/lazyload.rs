//! Bounded catch-up windows for "load older" / "load newer".
//!
//! Unlike `get_between`, both bounds here are EXCLUSIVE: an entry
//! sitting exactly on a boundary a client has already seen must never be
//! served twice. Duplicate avoidance beats boundary inclusiveness for
//! incremental catch-up, and the two behaviors are kept deliberately
//! distinct.

use crate::core::{ProjectedEntry, TimeBasis, Timestamp, LAZYLOAD_CEILING};

/// A lazyload response slice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LazyloadSlice {
    /// Newest-first entries inside the window, capped.
    pub entries: Vec<ProjectedEntry>,
    /// Visible entries strictly older than the oldest entry served here;
    /// zero when the slice is empty. Drives the client's "load more".
    pub remaining_older: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct LazyloadWindow {
    page_size: usize,
}

impl LazyloadWindow {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.clamp(1, LAZYLOAD_CEILING),
        }
    }

    /// Slice the ascending visible feed. `max_ts` excludes entries at or
    /// above it, `min_ts` excludes entries at or below it.
    pub fn window(
        &self,
        feed: &[ProjectedEntry],
        max_ts: Option<Timestamp>,
        min_ts: Option<Timestamp>,
    ) -> LazyloadSlice {
        let admitted = |e: &ProjectedEntry| {
            let t = e.display_ts(TimeBasis::Created);
            max_ts.map_or(true, |max| t < max) && min_ts.map_or(true, |min| t > min)
        };

        let entries: Vec<ProjectedEntry> = feed
            .iter()
            .rev()
            .filter(|e| admitted(e))
            .take(self.page_size)
            .cloned()
            .collect();

        let remaining_older = match entries.last() {
            None => 0,
            Some(oldest) => {
                let floor = oldest.display_ts(TimeBasis::Created);
                feed.iter()
                    .filter(|e| e.display_ts(TimeBasis::Created) < floor)
                    .count()
            }
        };

        LazyloadSlice {
            entries,
            remaining_older,
        }
    }
}
