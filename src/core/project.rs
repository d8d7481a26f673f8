//! Layer 4: Feed projection
//!
//! Reduces a set of records to the currently-visible entries. Pure over
//! its input: projecting the same set twice yields identical output, and
//! a superset can only add, replace, or remove entries consistent with
//! the chain rules.

use serde::{Deserialize, Serialize};

use super::chain::{resolve_chains, ChainHead};
use super::identity::{AuthorId, RecordId};
use super::record::{EntryRecord, RecordKind};
use super::time::Timestamp;

/// Output ordering. Required at every call site: the live feed and the
/// archive flatten want opposite orders, and a hidden default has bitten
/// before.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

/// Which timestamp a windowed query compares against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeBasis {
    /// The originating record's append time - display ordering.
    Created,
    /// The latest record's append time - edit-window queries.
    LastModified,
}

/// Current state of one entry, derived from its chain. Never persisted;
/// recomputed from whatever record set is in scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedEntry {
    pub canonical_id: RecordId,
    /// Kind of the chain's latest record.
    pub kind: RecordKind,
    /// Raw content of the latest record.
    pub content: String,
    /// Append time of the originating record - stable across edits.
    pub created_at: Timestamp,
    /// Append time of the latest record in the chain.
    pub last_modified_at: Timestamp,
    pub authors: Vec<AuthorId>,
    /// False iff the latest record is a delete.
    pub visible: bool,
}

impl ProjectedEntry {
    fn from_head(head: &ChainHead<'_>) -> Self {
        Self {
            canonical_id: head.canonical_id,
            kind: head.latest.kind,
            content: head.latest.content.clone(),
            created_at: head.first.created_at,
            last_modified_at: head.latest.created_at,
            authors: head.latest.authors.clone(),
            visible: head.latest.kind != RecordKind::Delete,
        }
    }

    pub fn display_ts(&self, basis: TimeBasis) -> Timestamp {
        match basis {
            TimeBasis::Created => self.created_at,
            TimeBasis::LastModified => self.last_modified_at,
        }
    }
}

/// Collapse every chain, deleted ones included, ascending by display
/// time. The `visible` flag tells them apart.
pub fn collapse(records: &[EntryRecord]) -> Vec<ProjectedEntry> {
    let mut entries: Vec<ProjectedEntry> = resolve_chains(records)
        .values()
        .map(ProjectedEntry::from_head)
        .collect();
    entries.sort_by_key(|e| (e.created_at, e.canonical_id));
    entries
}

/// The visible feed: deleted chains are omitted entirely, not served as
/// tombstones.
pub fn project(records: &[EntryRecord], order: Order) -> Vec<ProjectedEntry> {
    let mut entries = collapse(records);
    entries.retain(|e| e.visible);
    if order == Order::Descending {
        entries.reverse();
    }
    entries
}
