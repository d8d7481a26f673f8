//! Stable pages over the flattened ascending feed.
//!
//! Absolute page numbers shift as entries are appended; cursor and
//! jump-to addressing anchor to a canonical id's position instead, which
//! stays put because the flatten is ascending and new entries only ever
//! append behind it.

use crate::core::{ProjectedEntry, RecordId};

use super::cursor::Cursor;

/// One page of the archive feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub entries: Vec<ProjectedEntry>,
    /// 1-based page that was actually served.
    pub page: u32,
    /// Total pages for the current feed length.
    pub pages: u32,
    /// Visible entries across the whole feed.
    pub total: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct Paginator {
    page_size: usize,
}

impl Paginator {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Serve an absolute page. Out-of-range numbers return empty
    /// `entries` with `pages`/`total` intact, never an error.
    pub fn page(&self, feed: &[ProjectedEntry], number: u32) -> Page {
        let number = number.max(1);
        let total = feed.len();
        let pages = self.page_count(total);

        let offset = self.page_size * (number as usize - 1);
        let entries = if offset >= total {
            Vec::new()
        } else {
            feed[offset..(offset + self.page_size).min(total)].to_vec()
        };

        Page {
            entries,
            page: number,
            pages,
            total,
        }
    }

    /// Serve the page containing the cursor's entry. An unknown cursor
    /// (entry deleted since it was handed out) falls back to page 1.
    pub fn by_cursor(&self, feed: &[ProjectedEntry], cursor: &Cursor) -> Page {
        self.page(feed, self.page_containing(feed, cursor.id).unwrap_or(1))
    }

    /// Serve the page containing `id`, for deep links to one entry.
    pub fn jump_to(&self, feed: &[ProjectedEntry], id: RecordId) -> Page {
        self.page(feed, self.page_containing(feed, id).unwrap_or(1))
    }

    /// 1-based page number holding the given canonical id.
    pub fn page_containing(&self, feed: &[ProjectedEntry], id: RecordId) -> Option<u32> {
        let position = feed.iter().position(|e| e.canonical_id == id)? + 1;
        Some(position.div_ceil(self.page_size) as u32)
    }

    fn page_count(&self, total: usize) -> u32 {
        total.div_ceil(self.page_size) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RecordKind, Timestamp};

    fn entry(id: u64, at: u64) -> ProjectedEntry {
        ProjectedEntry {
            canonical_id: RecordId::new(id).unwrap(),
            kind: RecordKind::New,
            content: format!("e{id}"),
            created_at: Timestamp::new(at),
            last_modified_at: Timestamp::new(at),
            authors: vec![],
            visible: true,
        }
    }

    fn feed(n: u64) -> Vec<ProjectedEntry> {
        (1..=n).map(|i| entry(i, i * 100)).collect()
    }

    #[test]
    fn page_math_covers_the_whole_feed() {
        let feed = feed(23);
        let paginator = Paginator::new(10);

        let first = paginator.page(&feed, 1);
        assert_eq!(first.pages, 3);
        assert_eq!(first.total, 23);
        assert_eq!(first.entries.len(), 10);

        let served: usize = (1..=first.pages)
            .map(|p| paginator.page(&feed, p).entries.len())
            .sum();
        assert_eq!(served, 23);
    }

    #[test]
    fn exact_multiple_has_no_ghost_page() {
        let feed = feed(20);
        let paginator = Paginator::new(10);
        assert_eq!(paginator.page(&feed, 1).pages, 2);
    }

    #[test]
    fn out_of_range_page_is_empty_not_an_error() {
        let feed = feed(5);
        let paginator = Paginator::new(10);
        let page = paginator.page(&feed, 7);
        assert!(page.entries.is_empty());
        assert_eq!(page.pages, 1);
        assert_eq!(page.total, 5);
    }

    #[test]
    fn empty_feed_has_zero_pages() {
        let paginator = Paginator::new(10);
        let page = paginator.page(&[], 1);
        assert!(page.entries.is_empty());
        assert_eq!(page.pages, 0);
        assert_eq!(page.total, 0);
    }

    #[test]
    fn cursor_page_survives_appends() {
        let mut entries = feed(15);
        let paginator = Paginator::new(5);
        let anchor = RecordId::new(7).unwrap();
        let cursor = Cursor::new(anchor, Timestamp::new(700));

        let before = paginator.by_cursor(&entries, &cursor);
        // new entries land at the end of the ascending flatten
        entries.push(entry(16, 1600));
        entries.push(entry(17, 1700));
        let after = paginator.by_cursor(&entries, &cursor);

        assert_eq!(before.page, after.page);
        assert_eq!(before.page, 2);
    }

    #[test]
    fn unknown_cursor_falls_back_to_first_page() {
        let feed = feed(8);
        let paginator = Paginator::new(5);
        let cursor = Cursor::new(RecordId::new(999).unwrap(), Timestamp::new(1));
        assert_eq!(paginator.by_cursor(&feed, &cursor).page, 1);
    }

    #[test]
    fn jump_to_lands_on_the_containing_page() {
        let feed = feed(23);
        let paginator = Paginator::new(10);
        let page = paginator.jump_to(&feed, RecordId::new(15).unwrap());
        assert_eq!(page.page, 2);
        assert!(page
            .entries
            .iter()
            .any(|e| e.canonical_id.get() == 15));
    }
}
