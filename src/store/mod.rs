//! The entry store: append path and windowed read path.
//!
//! Writes are single-record appends with structural validation only; a
//! conflicting edit is resolved by append order, never rejected. Reads
//! are pure over a snapshot of the log, served through the per-stream
//! ascending projection cache.

mod cache;
mod log;

use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::core::{
    collapse, project, AuthorId, CoreError, EntryRecord, Limits, Order, ProjectedEntry, RecordId,
    RecordKind, StreamId, TimeBasis, Timestamp,
};
use crate::error::{Effect, Transience};

use cache::FeedCache;
use log::EntryLog;

/// Write-path validation and internal failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("entry content is empty")]
    EmptyContent,

    #[error("entry content is {len} bytes (max {max})")]
    ContentTooLarge { len: usize, max: usize },

    #[error("{count} authors on one entry (max {max})")]
    TooManyAuthors { count: usize, max: usize },

    #[error("no entry {id} in stream {stream}")]
    UnknownTarget { stream: StreamId, id: RecordId },

    #[error("entry {id} belongs to stream {actual}, not {requested}")]
    WrongStream {
        id: RecordId,
        requested: StreamId,
        actual: StreamId,
    },

    #[error("entry {id} has been deleted")]
    TargetDeleted { id: RecordId },

    #[error("internal: {0}")]
    Internal(&'static str),
}

impl StoreError {
    pub fn transience(&self) -> Transience {
        match self {
            StoreError::Internal(_) => Transience::Unknown,
            _ => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            StoreError::Internal(_) => Effect::Unknown,
            // validation happens before any mutation
            _ => Effect::None,
        }
    }
}

/// Payload for an `insert` or `update` append.
#[derive(Clone, Debug, Default)]
pub struct EntryDraft {
    pub content: String,
    /// Primary author first. An update with no authors inherits the
    /// superseded record's attribution.
    pub authors: Vec<AuthorId>,
    /// Explicit append wall time; None means "now". Clamped so the
    /// stream's append times never go backward.
    pub at: Option<Timestamp>,
}

impl EntryDraft {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn at(mut self, ts: Timestamp) -> Self {
        self.at = Some(ts);
        self
    }

    pub fn by(mut self, author: AuthorId) -> Self {
        self.authors.push(author);
        self
    }
}

/// Raw-record read filter for `get_all`.
#[derive(Clone, Debug, Default)]
pub struct RecordFilter {
    /// Restrict to these kinds; None means all.
    pub kinds: Option<Vec<RecordKind>>,
}

impl RecordFilter {
    fn admits(&self, record: &EntryRecord) -> bool {
        match &self.kinds {
            None => true,
            Some(kinds) => kinds.contains(&record.kind),
        }
    }
}

/// Append-only store for all streams.
pub struct EntryStore {
    log: RwLock<EntryLog>,
    cache: FeedCache,
    limits: Limits,
}

impl EntryStore {
    pub fn new(limits: Limits) -> Self {
        Self {
            log: RwLock::new(EntryLog::new()),
            cache: FeedCache::new(),
            limits,
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    // =========================================================================
    // Append path
    // =========================================================================

    /// Append a `new` record, introducing an entry identity.
    pub fn insert(&self, stream: StreamId, draft: EntryDraft) -> Result<EntryRecord, StoreError> {
        self.check_draft(&draft)?;
        let mut log = self.write_log()?;

        let id = log.issue();
        log.claim(id, stream);
        let slot = log.stream_mut(stream);
        let created_at = match draft.at {
            Some(at) => slot.clock_mut().observe(at),
            None => slot.clock_mut().tick(),
        };
        let record = EntryRecord {
            id,
            stream_id: stream,
            kind: RecordKind::New,
            replaces: None,
            content: draft.content,
            created_at,
            authors: draft.authors,
        };
        slot.push(record.clone());
        drop(log);

        self.cache.invalidate(stream)?;
        tracing::debug!(%stream, id = %record.id, "entry inserted");
        Ok(record)
    }

    /// Append an `update` record superseding the chain that contains
    /// `entry_id`. The chain tip is resolved here, so callers address
    /// entries by the id the feed shows and chains stay simple lists.
    pub fn update(
        &self,
        stream: StreamId,
        entry_id: RecordId,
        draft: EntryDraft,
    ) -> Result<EntryRecord, StoreError> {
        self.check_draft(&draft)?;
        self.supersede(stream, entry_id, RecordKind::Update, Some(draft))
    }

    /// Append a `delete` record hiding the entry from the feed.
    pub fn delete(&self, stream: StreamId, entry_id: RecordId) -> Result<EntryRecord, StoreError> {
        self.supersede(stream, entry_id, RecordKind::Delete, None)
    }

    fn supersede(
        &self,
        stream: StreamId,
        entry_id: RecordId,
        kind: RecordKind,
        draft: Option<EntryDraft>,
    ) -> Result<EntryRecord, StoreError> {
        let mut log = self.write_log()?;

        match log.owner_of(entry_id) {
            None => return Err(StoreError::UnknownTarget { stream, id: entry_id }),
            Some(actual) if actual != stream => {
                return Err(StoreError::WrongStream {
                    id: entry_id,
                    requested: stream,
                    actual,
                });
            }
            Some(_) => {}
        }

        let tip = log
            .stream(stream)
            .and_then(|s| s.chain_tip(entry_id))
            .ok_or(StoreError::UnknownTarget { stream, id: entry_id })?;
        if tip.is_tombstone() {
            return Err(StoreError::TargetDeleted { id: entry_id });
        }
        let tip_id = tip.id;
        let tip_authors = tip.authors.clone();

        let id = log.issue();
        log.claim(id, stream);
        let slot = log.stream_mut(stream);
        let (content, authors, at) = match draft {
            Some(draft) => {
                let authors = if draft.authors.is_empty() {
                    tip_authors
                } else {
                    draft.authors
                };
                (draft.content, authors, draft.at)
            }
            None => (String::new(), Vec::new(), None),
        };
        let created_at = match at {
            Some(at) => slot.clock_mut().observe(at),
            None => slot.clock_mut().tick(),
        };
        let record = EntryRecord {
            id,
            stream_id: stream,
            kind,
            replaces: Some(tip_id),
            content,
            created_at,
            authors,
        };
        slot.push(record.clone());
        drop(log);

        self.cache.invalidate(stream)?;
        tracing::debug!(%stream, id = %record.id, kind = %record.kind, replaces = %tip_id, "entry superseded");
        Ok(record)
    }

    fn check_draft(&self, draft: &EntryDraft) -> Result<(), StoreError> {
        if draft.content.trim().is_empty() {
            return Err(StoreError::EmptyContent);
        }
        if draft.content.len() > self.limits.max_content_bytes {
            return Err(StoreError::ContentTooLarge {
                len: draft.content.len(),
                max: self.limits.max_content_bytes,
            });
        }
        if draft.authors.len() > self.limits.max_authors {
            return Err(StoreError::TooManyAuthors {
                count: draft.authors.len(),
                max: self.limits.max_authors,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Read path
    // =========================================================================

    /// Raw records for a stream, newest-first.
    pub fn get_all(
        &self,
        stream: StreamId,
        filter: &RecordFilter,
    ) -> Result<Vec<EntryRecord>, StoreError> {
        let log = self.read_log()?;
        let Some(slot) = log.stream(stream) else {
            return Ok(Vec::new());
        };
        Ok(slot
            .records()
            .iter()
            .rev()
            .filter(|r| filter.admits(r))
            .cloned()
            .collect())
    }

    /// The ascending visible feed, via the per-stream cache.
    pub fn flattened(&self, stream: StreamId) -> Result<Arc<Vec<ProjectedEntry>>, StoreError> {
        if let Some(feed) = self.cache.get(stream)? {
            return Ok(feed);
        }
        let feed = {
            let log = self.read_log()?;
            let records = log.stream(stream).map(|s| s.records()).unwrap_or(&[]);
            Arc::new(project(records, Order::Ascending))
        };
        self.cache.put(stream, feed.clone())?;
        tracing::trace!(%stream, entries = feed.len(), "feed cache rebuilt");
        Ok(feed)
    }

    /// Visible entries whose display timestamp t satisfies
    /// `start <= t <= end`, ascending. Both bounds inclusive; `end =
    /// None` means everything at or after `start`.
    pub fn get_between(
        &self,
        stream: StreamId,
        start: Timestamp,
        end: Option<Timestamp>,
    ) -> Result<Vec<ProjectedEntry>, StoreError> {
        self.get_between_by(stream, start, end, TimeBasis::Created, Order::Ascending)
    }

    /// `get_between` with the timestamp basis and ordering spelled out.
    /// Edit-window queries pass `TimeBasis::LastModified`; the live feed
    /// asks for `Order::Descending`, the archive for ascending.
    pub fn get_between_by(
        &self,
        stream: StreamId,
        start: Timestamp,
        end: Option<Timestamp>,
        basis: TimeBasis,
        order: Order,
    ) -> Result<Vec<ProjectedEntry>, StoreError> {
        let feed = self.flattened(stream)?;
        let mut entries: Vec<ProjectedEntry> = feed
            .iter()
            .filter(|e| {
                let t = e.display_ts(basis);
                t >= start && end.map_or(true, |end| t <= end)
            })
            .cloned()
            .collect();
        if order == Order::Descending {
            entries.reverse();
        }
        Ok(entries)
    }

    /// Newest visible entry, or None for an empty/fully-deleted stream.
    pub fn get_latest(&self, stream: StreamId) -> Result<Option<ProjectedEntry>, StoreError> {
        Ok(self.flattened(stream)?.last().cloned())
    }

    /// Append time of the newest raw record, deletes included. This is
    /// what pollers key their next window off: a delete must advance it
    /// or clients would never refetch.
    pub fn get_latest_timestamp(&self, stream: StreamId) -> Result<Option<Timestamp>, StoreError> {
        let log = self.read_log()?;
        Ok(log
            .stream(stream)
            .and_then(|s| s.last())
            .map(|r| r.created_at))
    }

    /// Look up one visible entry by canonical id (any chain id works).
    ///
    /// Returns None when the id belongs to a different stream, even if
    /// the entry exists there - callers must not be able to read across
    /// streams by guessing ids.
    pub fn get_by_id(
        &self,
        stream: StreamId,
        entry_id: RecordId,
    ) -> Result<Option<ProjectedEntry>, StoreError> {
        let canonical = {
            let log = self.read_log()?;
            match log.owner_of(entry_id) {
                Some(actual) if actual == stream => {
                    log.stream(stream).and_then(|s| s.canonical(entry_id))
                }
                _ => None,
            }
        };
        let Some(canonical) = canonical else {
            return Ok(None);
        };
        let feed = self.flattened(stream)?;
        Ok(feed.iter().find(|e| e.canonical_id == canonical).cloned())
    }

    /// Project the single chain containing `entry_id`, hidden or not.
    /// This is what the write path answers with: a delete still has to
    /// describe the record it produced.
    pub fn project_one(
        &self,
        stream: StreamId,
        entry_id: RecordId,
    ) -> Result<Option<ProjectedEntry>, StoreError> {
        let log = self.read_log()?;
        match log.owner_of(entry_id) {
            Some(actual) if actual == stream => {}
            _ => return Ok(None),
        }
        let Some(slot) = log.stream(stream) else {
            return Ok(None);
        };
        let (Some(canonical), Some(tip)) = (slot.canonical(entry_id), slot.chain_tip(entry_id))
        else {
            return Ok(None);
        };
        let first = slot.record(canonical).unwrap_or(tip);
        Ok(Some(ProjectedEntry {
            canonical_id: canonical,
            kind: tip.kind,
            content: tip.content.clone(),
            created_at: first.created_at,
            last_modified_at: tip.created_at,
            authors: tip.authors.clone(),
            visible: !tip.is_tombstone(),
        }))
    }

    /// Every chain head, hidden ones included, ascending. Admin/debug
    /// surface; the feed never serves this.
    pub fn collapse_all(&self, stream: StreamId) -> Result<Vec<ProjectedEntry>, StoreError> {
        let log = self.read_log()?;
        let records = log.stream(stream).map(|s| s.records()).unwrap_or(&[]);
        Ok(collapse(records))
    }

    fn read_log(&self) -> Result<std::sync::RwLockReadGuard<'_, EntryLog>, StoreError> {
        self.log
            .read()
            .map_err(|_| StoreError::Internal("entry log lock poisoned"))
    }

    fn write_log(&self) -> Result<std::sync::RwLockWriteGuard<'_, EntryLog>, StoreError> {
        self.log
            .write()
            .map_err(|_| StoreError::Internal("entry log lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> EntryStore {
        EntryStore::new(Limits::default())
    }

    fn stream(raw: u64) -> StreamId {
        StreamId::new(raw).unwrap()
    }

    #[test]
    fn insert_then_read_back() {
        let store = store();
        let s = stream(1);
        let rec = store
            .insert(s, EntryDraft::text("first").at(Timestamp::new(100)))
            .unwrap();

        let feed = store.flattened(s).unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].canonical_id, rec.id);
        assert_eq!(feed[0].content, "first");
    }

    #[test]
    fn get_between_bounds_are_inclusive() {
        let store = store();
        let s = stream(1);
        for (ts, text) in [(100, "a"), (200, "b"), (300, "c")] {
            store
                .insert(s, EntryDraft::text(text).at(Timestamp::new(ts)))
                .unwrap();
        }

        let within = store
            .get_between(s, Timestamp::new(100), Some(Timestamp::new(300)))
            .unwrap();
        assert_eq!(within.len(), 3);

        let edges = store
            .get_between(s, Timestamp::new(200), Some(Timestamp::new(200)))
            .unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].content, "b");

        let open_ended = store.get_between(s, Timestamp::new(200), None).unwrap();
        assert_eq!(open_ended.len(), 2);
    }

    #[test]
    fn update_keeps_display_time_and_identity() {
        let store = store();
        let s = stream(1);
        let a = store
            .insert(s, EntryDraft::text("v1").at(Timestamp::new(100)))
            .unwrap();
        store
            .update(s, a.id, EntryDraft::text("v2").at(Timestamp::new(500)))
            .unwrap();

        let feed = store.flattened(s).unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].canonical_id, a.id);
        assert_eq!(feed[0].content, "v2");
        assert_eq!(feed[0].created_at.get(), 100);
        assert_eq!(feed[0].last_modified_at.get(), 500);
    }

    #[test]
    fn second_update_addresses_canonical_id() {
        let store = store();
        let s = stream(1);
        let a = store.insert(s, EntryDraft::text("v1")).unwrap();
        store.update(s, a.id, EntryDraft::text("v2")).unwrap();
        // writer still holds the canonical id, not the tip id
        store.update(s, a.id, EntryDraft::text("v3")).unwrap();

        let feed = store.flattened(s).unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].content, "v3");
    }

    #[test]
    fn delete_hides_and_blocks_further_edits() {
        let store = store();
        let s = stream(1);
        let a = store.insert(s, EntryDraft::text("gone soon")).unwrap();
        store.delete(s, a.id).unwrap();

        assert!(store.flattened(s).unwrap().is_empty());
        assert!(store.get_by_id(s, a.id).unwrap().is_none());

        assert!(matches!(
            store.update(s, a.id, EntryDraft::text("zombie")),
            Err(StoreError::TargetDeleted { .. })
        ));
        assert!(matches!(
            store.delete(s, a.id),
            Err(StoreError::TargetDeleted { .. })
        ));
    }

    #[test]
    fn cross_stream_writes_are_rejected() {
        let store = store();
        let a = store.insert(stream(1), EntryDraft::text("mine")).unwrap();

        assert!(matches!(
            store.update(stream(2), a.id, EntryDraft::text("theft")),
            Err(StoreError::WrongStream { .. })
        ));
    }

    #[test]
    fn cross_stream_reads_come_back_empty() {
        let store = store();
        let a = store.insert(stream(1), EntryDraft::text("mine")).unwrap();

        assert!(store.get_by_id(stream(2), a.id).unwrap().is_none());
        assert!(store.get_by_id(stream(1), a.id).unwrap().is_some());
    }

    #[test]
    fn unknown_target_is_a_validation_error() {
        let store = store();
        let ghost = RecordId::new(999).unwrap();
        assert!(matches!(
            store.update(stream(1), ghost, EntryDraft::text("x")),
            Err(StoreError::UnknownTarget { .. })
        ));
    }

    #[test]
    fn empty_and_oversized_content_rejected() {
        let store = store();
        let s = stream(1);
        assert!(matches!(
            store.insert(s, EntryDraft::text("   ")),
            Err(StoreError::EmptyContent)
        ));
        let max = store.limits().max_content_bytes;
        assert!(matches!(
            store.insert(s, EntryDraft::text("x".repeat(max + 1))),
            Err(StoreError::ContentTooLarge { .. })
        ));
    }

    #[test]
    fn get_all_is_newest_first_and_filterable() {
        let store = store();
        let s = stream(1);
        let a = store.insert(s, EntryDraft::text("a")).unwrap();
        let b = store.insert(s, EntryDraft::text("b")).unwrap();
        store.delete(s, a.id).unwrap();

        let all = store.get_all(s, &RecordFilter::default()).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].id > all[1].id && all[1].id > all[2].id);

        let deletes = store
            .get_all(
                s,
                &RecordFilter {
                    kinds: Some(vec![RecordKind::Delete]),
                },
            )
            .unwrap();
        assert_eq!(deletes.len(), 1);
        assert_eq!(deletes[0].replaces, Some(a.id));
        let _ = b;
    }

    #[test]
    fn latest_timestamp_advances_on_delete() {
        let store = store();
        let s = stream(1);
        let a = store
            .insert(s, EntryDraft::text("a").at(Timestamp::new(100)))
            .unwrap();
        assert_eq!(
            store.get_latest_timestamp(s).unwrap(),
            Some(Timestamp::new(100))
        );

        store.delete(s, a.id).unwrap();
        let after = store.get_latest_timestamp(s).unwrap().unwrap();
        assert!(after >= Timestamp::new(100));
        assert!(store.get_latest(s).unwrap().is_none());
    }

    #[test]
    fn writer_reads_its_own_append() {
        let store = store();
        let s = stream(1);
        store
            .insert(s, EntryDraft::text("one").at(Timestamp::new(100)))
            .unwrap();
        // warm the cache
        assert_eq!(store.flattened(s).unwrap().len(), 1);

        store
            .insert(s, EntryDraft::text("two").at(Timestamp::new(200)))
            .unwrap();
        // invalidation happened before the insert returned
        assert_eq!(store.flattened(s).unwrap().len(), 2);
    }

    #[test]
    fn unknown_stream_reads_are_empty_not_errors() {
        let store = store();
        let s = stream(77);
        assert!(store.get_all(s, &RecordFilter::default()).unwrap().is_empty());
        assert!(store.get_between(s, Timestamp::ZERO, None).unwrap().is_empty());
        assert!(store.get_latest(s).unwrap().is_none());
        assert!(store.get_latest_timestamp(s).unwrap().is_none());
    }
}
