//! Core error taxonomy.
//!
//! Everything here is a validation failure: retrying without changing the
//! input can never succeed, and no append has happened by the time one of
//! these is returned.

use thiserror::Error;

use crate::error::{Effect, Transience};

/// A malformed identifier.
#[derive(Debug, Error)]
pub enum InvalidId {
    #[error("invalid stream id {raw:?}: {reason}")]
    Stream { raw: String, reason: String },

    #[error("invalid record id {raw:?}: {reason}")]
    Record { raw: String, reason: String },

    #[error("invalid author id {raw:?}: {reason}")]
    Author { raw: String, reason: String },
}

/// Validation errors raised by the core types.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoreError {
    #[error(transparent)]
    InvalidId(#[from] InvalidId),

    #[error("invalid timestamp {raw:?}: {reason}")]
    InvalidTimestamp { raw: String, reason: String },

    #[error("invalid cursor {raw:?}: {reason}")]
    InvalidCursor { raw: String, reason: String },

    /// A record whose kind and `replaces` pointer disagree.
    #[error("malformed {kind} record {id}: {reason}")]
    MalformedRecord {
        id: super::identity::RecordId,
        kind: super::record::RecordKind,
        reason: String,
    },
}

impl CoreError {
    pub fn transience(&self) -> Transience {
        Transience::Permanent
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }
}
