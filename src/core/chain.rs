//! Layer 3: Replace-chain resolution
//!
//! A chain is the set of records that are transitively about the same
//! entry. Canonical identity is the earliest record reachable through
//! `replaces` back-pointers; the latest record (greatest log position)
//! is what the feed shows. Position-based on purpose: clock skew must
//! never reorder a chain.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::identity::RecordId;
use super::record::EntryRecord;

/// Collapsed view of one chain, restricted to the records that were in
/// the input set.
#[derive(Clone, Copy, Debug)]
pub struct ChainHead<'a> {
    /// Identity of the entry: the earliest reachable id. May name a
    /// record absent from the input when the chain was cut by a window.
    pub canonical_id: RecordId,
    /// Earliest input record of the chain (the `New` record when the
    /// full chain is present). Supplies the display timestamp.
    pub first: &'a EntryRecord,
    /// Latest input record of the chain. Supplies content, authors and
    /// visibility.
    pub latest: &'a EntryRecord,
    /// How many input records collapsed into this head.
    pub records: usize,
}

/// Group records by canonical identity and pick each chain's latest.
///
/// Tolerant by design: a record whose `replaces` target is missing from
/// the input is grouped under that absent id, and a (structurally
/// impossible) cycle stops the walk at the record where it closes
/// instead of looping. Ordering within a chain is by `id` alone.
pub fn resolve_chains(records: &[EntryRecord]) -> BTreeMap<RecordId, ChainHead<'_>> {
    let by_id: HashMap<RecordId, &EntryRecord> =
        records.iter().map(|r| (r.id, r)).collect();

    let mut canonical_memo: HashMap<RecordId, RecordId> = HashMap::new();
    let mut heads: BTreeMap<RecordId, ChainHead<'_>> = BTreeMap::new();

    for record in records {
        let canonical = canonical_of(record, &by_id, &mut canonical_memo);
        heads
            .entry(canonical)
            .and_modify(|head| {
                head.records += 1;
                if record.id < head.first.id {
                    head.first = record;
                }
                if record.id > head.latest.id {
                    head.latest = record;
                }
            })
            .or_insert(ChainHead {
                canonical_id: canonical,
                first: record,
                latest: record,
                records: 1,
            });
    }

    heads
}

fn canonical_of(
    record: &EntryRecord,
    by_id: &HashMap<RecordId, &EntryRecord>,
    memo: &mut HashMap<RecordId, RecordId>,
) -> RecordId {
    if let Some(&canonical) = memo.get(&record.id) {
        return canonical;
    }

    let mut path: Vec<RecordId> = Vec::new();
    let mut visited: BTreeSet<RecordId> = BTreeSet::new();
    let mut current = record;

    let canonical = loop {
        if let Some(&known) = memo.get(&current.id) {
            break known;
        }
        path.push(current.id);
        visited.insert(current.id);

        match current.replaces {
            None => break current.id,
            Some(target) => match by_id.get(&target) {
                // chain cut by the window: group under the absent id
                None => break target,
                Some(prev) if visited.contains(&prev.id) => break current.id,
                Some(prev) => current = prev,
            },
        }
    };

    for id in path {
        memo.insert(id, canonical);
    }
    canonical
}
