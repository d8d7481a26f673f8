//! Layer 2: The append-only record
//!
//! One EntryRecord per append. Records are never mutated or physically
//! deleted; edits and removals are new records that supersede an earlier
//! one through `replaces`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::CoreError;
use super::identity::{AuthorId, RecordId, StreamId};
use super::time::Timestamp;

/// What an append does to the entry identity it touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Introduces a new entry identity.
    New,
    /// Supersedes an earlier record of the same identity with new content.
    Update,
    /// Supersedes an earlier record, hiding the identity from the feed.
    Delete,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::New => "new",
            RecordKind::Update => "update",
            RecordKind::Delete => "delete",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable log record.
///
/// `id` is the log position and the ordering primitive for chain
/// resolution. `created_at` is display/windowing time only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub id: RecordId,
    pub stream_id: StreamId,
    pub kind: RecordKind,
    /// Record this one supersedes. None iff `kind` is `New`.
    /// Always points at a record of the same stream.
    pub replaces: Option<RecordId>,
    /// Raw text payload. Empty for `Delete`.
    pub content: String,
    pub created_at: Timestamp,
    /// Primary author first, contributors after. Empty when hidden.
    pub authors: Vec<AuthorId>,
}

impl EntryRecord {
    /// Check the kind/replaces agreement every record must satisfy.
    pub fn validate(&self) -> Result<(), CoreError> {
        match (self.kind, self.replaces) {
            (RecordKind::New, Some(_)) => Err(CoreError::MalformedRecord {
                id: self.id,
                kind: self.kind,
                reason: "a new record cannot replace anything".into(),
            }),
            (RecordKind::Update, None) | (RecordKind::Delete, None) => {
                Err(CoreError::MalformedRecord {
                    id: self.id,
                    kind: self.kind,
                    reason: "must name the record it replaces".into(),
                })
            }
            (_, Some(target)) if target == self.id => Err(CoreError::MalformedRecord {
                id: self.id,
                kind: self.kind,
                reason: "cannot replace itself".into(),
            }),
            _ => Ok(()),
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.kind == RecordKind::Delete
    }
}
