//! The "last known entry" cursor.
//!
//! Opaque to clients, `"<id>-<timestamp>"` on the wire. The id anchors
//! pagination to a feed position; the timestamp rides along so clients
//! can seed incremental polls from the same token.

use std::fmt;

use crate::core::{CoreError, RecordId, Timestamp};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub id: RecordId,
    pub ts: Timestamp,
}

impl Cursor {
    pub fn new(id: RecordId, ts: Timestamp) -> Self {
        Self { id, ts }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let invalid = |reason: &str| CoreError::InvalidCursor {
            raw: s.to_string(),
            reason: reason.to_string(),
        };

        let (id_part, ts_part) = s.split_once('-').ok_or_else(|| invalid("missing '-'"))?;
        let id = RecordId::parse(id_part).map_err(|_| invalid("bad id segment"))?;
        let ts: u64 = ts_part
            .parse()
            .map_err(|_| invalid("bad timestamp segment"))?;
        Ok(Self {
            id,
            ts: Timestamp::new(ts),
        })
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.id, self.ts)
    }
}
