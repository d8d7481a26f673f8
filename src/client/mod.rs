//! Client-side polling: when to fetch, how hard to back off, when to
//! give up.

pub mod backoff;
pub mod poller;

pub use backoff::{BackoffPolicy, BackoffState, Focus};
pub use poller::{
    EntryFetcher, FetchError, PollEvent, PollRequest, PollUpdate, PollingConfig,
    PollingController, StopReason,
};
