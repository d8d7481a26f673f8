//! Core domain types for liveline
//!
//! Module hierarchy follows type dependency order:
//! - time: Timestamp + per-stream monotonic clock (Layer 0)
//! - identity: StreamId, RecordId, AuthorId (Layer 1)
//! - record: RecordKind, EntryRecord (Layer 2)
//! - chain: replace-chain resolution (Layer 3)
//! - project: visible-feed projection (Layer 4)

pub mod chain;
pub mod error;
pub mod identity;
pub mod limits;
pub mod project;
pub mod record;
pub mod time;

pub use chain::{resolve_chains, ChainHead};
pub use error::{CoreError, InvalidId};
pub use identity::{AuthorId, RecordId, StreamId};
pub use limits::{Limits, LAZYLOAD_CEILING};
pub use project::{collapse, project, Order, ProjectedEntry, TimeBasis};
pub use record::{EntryRecord, RecordKind};
pub use time::{StreamClock, Timestamp};
