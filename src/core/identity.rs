//! Layer 1: Identity atoms
//!
//! StreamId: the parent article/stream a record belongs to
//! RecordId: log position of one append-only record
//! AuthorId: author attribution, primary first

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{CoreError, InvalidId};

/// Stream identifier - the parent article this log hangs off.
///
/// Issued by the host CMS; anything non-zero is accepted.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(u64);

impl StreamId {
    pub fn new(raw: u64) -> Result<Self, CoreError> {
        if raw == 0 {
            Err(InvalidId::Stream {
                raw: raw.to_string(),
                reason: "must be non-zero".into(),
            }
            .into())
        } else {
            Ok(Self(raw))
        }
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamId({})", self.0)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Record identifier - the record's position in the log.
///
/// Monotonically issued by the store; unique across all streams, so a
/// record id also pins down which stream owns it. Only the store
/// allocates new ones.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    pub fn new(raw: u64) -> Result<Self, CoreError> {
        if raw == 0 {
            Err(InvalidId::Record {
                raw: raw.to_string(),
                reason: "must be non-zero".into(),
            }
            .into())
        } else {
            Ok(Self(raw))
        }
    }

    /// Parse from decimal text (cursor segments, route params).
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let raw: u64 = s.parse().map_err(|_| InvalidId::Record {
            raw: s.to_string(),
            reason: "not a decimal integer".into(),
        })?;
        Self::new(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Author identifier - non-empty string.
///
/// The host CMS names authors; no validation beyond non-empty.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(String);

impl AuthorId {
    pub fn new(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if s.trim().is_empty() {
            Err(InvalidId::Author {
                raw: s,
                reason: "empty".into(),
            }
            .into())
        } else {
            Ok(Self(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthorId({:?})", self.0)
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
