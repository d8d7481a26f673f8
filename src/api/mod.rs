//! The endpoint contract.
//!
//! Transport-free: the host routing layer maps HTTP calls onto
//! `FeedEndpoint` methods and serializes the typed responses. Errors
//! carry the status the transport should answer with.

pub mod convert;
pub mod endpoint;
pub mod schema;

use thiserror::Error;

use crate::error::{Effect, Transience};
use crate::store::StoreError;

pub use convert::entry_to_wire;
pub use endpoint::{EditGate, FeedEndpoint, OpenGate};
pub use schema::{
    CacheHint, CrudAction, CrudRequest, CrudResponse, EntriesResponse, LazyloadResponse,
    PagedResponse, PreviewResponse, SingleEntryResponse, WireEntry,
};

/// Surface error with its HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 403 - the caller lacks the capability for this write.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// 406 - malformed request; never retried automatically.
    #[error("{0}")]
    Invalid(String),

    /// 500 - the append itself failed; the user may retry manually, the
    /// server never retries silently.
    #[error("write failed: {0}")]
    WriteFailed(String),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Forbidden(_) => 403,
            ApiError::Invalid(_) => 406,
            ApiError::WriteFailed(_) => 500,
        }
    }

    pub fn transience(&self) -> Transience {
        match self {
            ApiError::WriteFailed(_) => Transience::Unknown,
            _ => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            ApiError::WriteFailed(_) => Effect::Unknown,
            _ => Effect::None,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Internal(reason) => ApiError::WriteFailed(reason.to_string()),
            other => ApiError::Invalid(other.to_string()),
        }
    }
}

impl From<crate::core::CoreError> for ApiError {
    fn from(err: crate::core::CoreError) -> Self {
        ApiError::Invalid(err.to_string())
    }
}
