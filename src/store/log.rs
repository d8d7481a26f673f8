//! Flat append-only record log with derived chain indexes.
//!
//! Records live in a per-stream append-only array; canonical identity
//! and chain tips are maintained in side indexes instead of walking
//! `replaces` pointers on every read. Appends are the only mutation.

use std::collections::{BTreeMap, HashMap};

use crate::core::{EntryRecord, RecordId, StreamClock, StreamId};

/// One stream's slice of the log.
#[derive(Debug, Default)]
pub(crate) struct StreamLog {
    records: Vec<EntryRecord>,
    by_id: HashMap<RecordId, usize>,
    clock: StreamClock,
    /// record id -> canonical id of its chain
    canonical_of: HashMap<RecordId, RecordId>,
    /// canonical id -> current chain tip
    tips: BTreeMap<RecordId, RecordId>,
}

impl StreamLog {
    pub fn records(&self) -> &[EntryRecord] {
        &self.records
    }

    pub fn record(&self, id: RecordId) -> Option<&EntryRecord> {
        self.by_id.get(&id).map(|&i| &self.records[i])
    }

    pub fn last(&self) -> Option<&EntryRecord> {
        self.records.last()
    }

    pub fn clock_mut(&mut self) -> &mut StreamClock {
        &mut self.clock
    }

    /// Canonical identity of any record in this stream.
    pub fn canonical(&self, id: RecordId) -> Option<RecordId> {
        self.canonical_of.get(&id).copied()
    }

    /// Current tip of the chain containing `id`.
    pub fn chain_tip(&self, id: RecordId) -> Option<&EntryRecord> {
        let canonical = self.canonical(id)?;
        let tip = self.tips.get(&canonical)?;
        self.record(*tip)
    }

    /// Append a record and fold it into the chain indexes.
    ///
    /// The caller has already validated the record; `replaces`, when
    /// set, names a record of this stream.
    pub fn push(&mut self, record: EntryRecord) {
        debug_assert!(record.validate().is_ok(), "append of malformed record");

        let canonical = match record.replaces {
            None => record.id,
            Some(target) => self.canonical(target).unwrap_or(target),
        };
        self.canonical_of.insert(record.id, canonical);
        self.tips.insert(canonical, record.id);
        self.by_id.insert(record.id, self.records.len());
        self.records.push(record);
    }
}

/// The whole log: one StreamLog per stream plus the global id issuer.
#[derive(Debug, Default)]
pub(crate) struct EntryLog {
    streams: BTreeMap<StreamId, StreamLog>,
    /// Which stream a record id belongs to. Ids are globally unique.
    owner: HashMap<RecordId, StreamId>,
    issued: u64,
}

impl EntryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next log position.
    pub fn issue(&mut self) -> RecordId {
        self.issued += 1;
        RecordId::new(self.issued).expect("issued ids start at 1")
    }

    pub fn stream(&self, id: StreamId) -> Option<&StreamLog> {
        self.streams.get(&id)
    }

    pub fn stream_mut(&mut self, id: StreamId) -> &mut StreamLog {
        self.streams.entry(id).or_default()
    }

    pub fn owner_of(&self, id: RecordId) -> Option<StreamId> {
        self.owner.get(&id).copied()
    }

    pub fn claim(&mut self, id: RecordId, stream: StreamId) {
        self.owner.insert(id, stream);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RecordKind, Timestamp};

    fn rec(id: RecordId, kind: RecordKind, replaces: Option<RecordId>) -> EntryRecord {
        EntryRecord {
            id,
            stream_id: StreamId::new(1).unwrap(),
            kind,
            replaces,
            content: "x".into(),
            created_at: Timestamp::new(100),
            authors: vec![],
        }
    }

    #[test]
    fn tips_follow_the_chain() {
        let mut log = EntryLog::new();
        let stream = StreamId::new(1).unwrap();

        let a = log.issue();
        log.claim(a, stream);
        log.stream_mut(stream).push(rec(a, RecordKind::New, None));

        let b = log.issue();
        log.claim(b, stream);
        log.stream_mut(stream)
            .push(rec(b, RecordKind::Update, Some(a)));

        let s = log.stream(stream).unwrap();
        assert_eq!(s.canonical(b), Some(a));
        assert_eq!(s.chain_tip(a).unwrap().id, b);
        // tip lookup works from any link of the chain
        assert_eq!(s.chain_tip(b).unwrap().id, b);
    }

    #[test]
    fn ids_are_globally_unique_and_owned() {
        let mut log = EntryLog::new();
        let s1 = StreamId::new(1).unwrap();
        let s2 = StreamId::new(2).unwrap();

        let a = log.issue();
        log.claim(a, s1);
        let b = log.issue();
        log.claim(b, s2);

        assert_ne!(a, b);
        assert_eq!(log.owner_of(a), Some(s1));
        assert_eq!(log.owner_of(b), Some(s2));
    }
}
