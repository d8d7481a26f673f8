//! Bounds enforced at the write and query boundaries.

use serde::{Deserialize, Serialize};

/// Hard ceiling on the lazyload window size, filterable config or not.
pub const LAZYLOAD_CEILING: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Entries per page for the paged archive feed.
    pub page_size: usize,
    /// Entries per lazyload window. Clamped to [1, LAZYLOAD_CEILING].
    pub lazyload_page_size: usize,
    /// Maximum raw content size per record, in bytes.
    pub max_content_bytes: usize,
    /// Maximum authors (primary + contributors) per record.
    pub max_authors: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            page_size: 10,
            lazyload_page_size: 5,
            max_content_bytes: 64 * 1024,
            max_authors: 8,
        }
    }
}

impl Limits {
    /// Lazyload window size with the hard ceiling applied.
    pub fn lazyload_window(&self) -> usize {
        self.lazyload_page_size.clamp(1, LAZYLOAD_CEILING)
    }
}
