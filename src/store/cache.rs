//! Per-stream projection cache.
//!
//! Holds the ascending visible feed for each stream. Appends invalidate
//! the owning stream's entry before the write is acknowledged, so the
//! writer's own next read is never stale. Rebuild happens on the next
//! read; two racing rebuilds produce the same value, so no lock is held
//! across projection.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::core::{ProjectedEntry, StreamId};

use super::StoreError;

#[derive(Debug, Default)]
pub(crate) struct FeedCache {
    shards: RwLock<HashMap<StreamId, Arc<Vec<ProjectedEntry>>>>,
}

impl FeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stream: StreamId) -> Result<Option<Arc<Vec<ProjectedEntry>>>, StoreError> {
        let shards = self
            .shards
            .read()
            .map_err(|_| StoreError::Internal("feed cache lock poisoned"))?;
        Ok(shards.get(&stream).cloned())
    }

    pub fn put(
        &self,
        stream: StreamId,
        feed: Arc<Vec<ProjectedEntry>>,
    ) -> Result<(), StoreError> {
        let mut shards = self
            .shards
            .write()
            .map_err(|_| StoreError::Internal("feed cache lock poisoned"))?;
        shards.insert(stream, feed);
        Ok(())
    }

    pub fn invalidate(&self, stream: StreamId) -> Result<(), StoreError> {
        let mut shards = self
            .shards
            .write()
            .map_err(|_| StoreError::Internal("feed cache lock poisoned"))?;
        shards.remove(&stream);
        tracing::trace!(%stream, "feed cache invalidated");
        Ok(())
    }
}
