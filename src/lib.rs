#![forbid(unsafe_code)]

pub mod api;
pub mod client;
pub mod config;
pub mod core;
pub mod error;
pub mod feed;
pub mod filter;
pub mod store;
pub mod telemetry;

pub use error::{Effect, Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;

// Re-export core types at crate root for convenience
pub use crate::core::{
    AuthorId, ChainHead, CoreError, EntryRecord, InvalidId, Limits, Order, ProjectedEntry,
    RecordId, RecordKind, StreamClock, StreamId, TimeBasis, Timestamp,
};
pub use crate::store::{EntryDraft, EntryStore, RecordFilter, StoreError};
