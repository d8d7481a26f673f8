//! The feed endpoint: typed operations behind the logical HTTP surface.

use std::sync::Arc;

use crate::config::Config;
use crate::core::{AuthorId, Order, RecordId, StreamId, TimeBasis, Timestamp};
use crate::feed::{Cursor, LazyloadWindow, Page, Paginator};
use crate::filter::{FilterRegistry, KEY_COMMAND};
use crate::store::{EntryDraft, EntryStore};

use super::schema::{
    CacheHint, CrudAction, CrudRequest, CrudResponse, EntriesResponse, LazyloadResponse,
    PagedResponse, PreviewResponse, SingleEntryResponse, WireEntry,
};
use super::{convert::entry_to_wire, ApiError};

/// Whether an author may write to a stream. The host CMS implements this
/// over its capability/nonce machinery.
pub trait EditGate: Send + Sync {
    fn can_publish(&self, stream: StreamId, author: Option<&AuthorId>) -> bool;
}

/// Gate that lets everything through. Tests and trusted embedders.
pub struct OpenGate;

impl EditGate for OpenGate {
    fn can_publish(&self, _stream: StreamId, _author: Option<&AuthorId>) -> bool {
        true
    }
}

pub struct FeedEndpoint {
    store: Arc<EntryStore>,
    config: Config,
    filters: FilterRegistry,
    gate: Box<dyn EditGate>,
}

impl FeedEndpoint {
    pub fn new(store: Arc<EntryStore>, config: Config) -> Self {
        Self {
            store,
            config,
            filters: FilterRegistry::with_defaults(),
            gate: Box::new(OpenGate),
        }
    }

    pub fn with_gate(mut self, gate: Box<dyn EditGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_filters(mut self, filters: FilterRegistry) -> Self {
        self.filters = filters;
        self
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    /// `/{stream}/entries/{start}/{end}` - the polling window,
    /// newest-first like the live feed it feeds.
    pub fn entries_between(
        &self,
        stream: StreamId,
        start: Timestamp,
        end: Option<Timestamp>,
    ) -> Result<EntriesResponse, ApiError> {
        let entries =
            self.store
                .get_between_by(stream, start, end, TimeBasis::Created, Order::Descending)?;
        let feed = self.store.flattened(stream)?;
        let paginator = Paginator::new(self.config.limits.page_size);
        let shape = paginator.page(&feed, 1);

        Ok(EntriesResponse {
            entries: self.to_wire(&entries),
            latest_timestamp: self.store.get_latest_timestamp(stream)?,
            refresh_interval: self.config.refresh_interval_secs,
            pages: shape.pages,
            total: shape.total,
        })
    }

    /// `/{stream}/crud` - all writes funnel through here.
    pub fn crud(&self, stream: StreamId, request: CrudRequest) -> Result<CrudResponse, ApiError> {
        if !self
            .gate
            .can_publish(stream, request.author_id.as_ref())
        {
            return Err(ApiError::Forbidden(
                "author may not publish to this stream".into(),
            ));
        }

        let written = match request.action {
            CrudAction::Insert => {
                let draft = EntryDraft {
                    content: request.content,
                    authors: authors_of(&request.author_id, &request.contributor_ids),
                    at: None,
                };
                self.store.insert(stream, draft)?
            }
            CrudAction::Update => {
                let entry_id = require_entry_id(&request.entry_id, "update")?;
                let draft = EntryDraft {
                    content: request.content,
                    authors: authors_of(&request.author_id, &request.contributor_ids),
                    at: None,
                };
                self.store.update(stream, entry_id, draft)?
            }
            CrudAction::Delete => {
                let entry_id = require_entry_id(&request.entry_id, "delete")?;
                self.store.delete(stream, entry_id)?
            }
            CrudAction::DeleteKey => {
                let entry_id = require_entry_id(&request.entry_id, "delete_key")?;
                let current = self
                    .store
                    .get_by_id(stream, entry_id)?
                    .ok_or_else(|| ApiError::Invalid(format!("unknown entry {entry_id}")))?;
                let key_filter = self
                    .filters
                    .get("key_command")
                    .ok_or_else(|| ApiError::WriteFailed("key filter unregistered".into()))?;
                if !key_filter.matches(&current.content) {
                    return Err(ApiError::Invalid(format!(
                        "entry {entry_id} carries no {KEY_COMMAND} flag"
                    )));
                }
                let draft = EntryDraft::text(key_filter.apply(&current.content));
                self.store.update(stream, entry_id, draft)?
            }
        };

        // serve back the post-write state of the touched chain
        let head = self
            .store
            .project_one(stream, written.id)?
            .ok_or_else(|| ApiError::WriteFailed("written entry vanished".into()))?;
        Ok(CrudResponse {
            entries: vec![entry_to_wire(&head, &self.filters, &self.config.share_base_url)],
            latest_timestamp: None,
        })
    }

    /// `/{stream}/lazyload/{max}/{min}` - 0 means unbounded.
    pub fn lazyload(
        &self,
        stream: StreamId,
        max_ts: u64,
        min_ts: u64,
    ) -> Result<LazyloadResponse, ApiError> {
        let feed = self.store.flattened(stream)?;
        let window = LazyloadWindow::new(self.config.limits.lazyload_window());
        let slice = window.window(
            &feed,
            (max_ts != 0).then(|| Timestamp::new(max_ts)),
            (min_ts != 0).then(|| Timestamp::new(min_ts)),
        );

        Ok(LazyloadResponse {
            entries: self.to_wire(&slice.entries),
            index: slice.remaining_older,
        })
    }

    /// `/{stream}/entry/{entry_id}` - one entry plus neighbor
    /// timestamps for navigation.
    pub fn single_entry(
        &self,
        stream: StreamId,
        entry_id: RecordId,
    ) -> Result<SingleEntryResponse, ApiError> {
        let feed = self.store.flattened(stream)?;
        let Some(position) = feed.iter().position(|e| e.canonical_id == entry_id) else {
            return Ok(SingleEntryResponse {
                entries: Vec::new(),
                index: 0,
                next_timestamp: None,
                previous_timestamp: None,
            });
        };

        Ok(SingleEntryResponse {
            entries: self.to_wire(&feed[position..=position]),
            index: position + 1,
            next_timestamp: feed.get(position + 1).map(|e| e.created_at),
            previous_timestamp: position
                .checked_sub(1)
                .and_then(|p| feed.get(p))
                .map(|e| e.created_at),
        })
    }

    /// `/{stream}/get-entries/{page}/{last_known_entry}` - the archive
    /// feed. `jump_to` wins over `cursor` wins over `page`.
    pub fn paged(
        &self,
        stream: StreamId,
        page: u32,
        cursor: Option<&str>,
        jump_to: Option<RecordId>,
    ) -> Result<PagedResponse, ApiError> {
        let feed = self.store.flattened(stream)?;
        let paginator = Paginator::new(self.config.limits.page_size);

        let served: Page = if let Some(id) = jump_to {
            paginator.jump_to(&feed, id)
        } else if let Some(raw) = cursor {
            let cursor = Cursor::parse(raw)?;
            paginator.by_cursor(&feed, &cursor)
        } else {
            paginator.page(&feed, page)
        };

        Ok(PagedResponse {
            entries: self.to_wire(&served.entries),
            page: served.page,
            pages: served.pages,
            total: served.total,
        })
    }

    /// `/{stream}/preview` - render raw content without appending it.
    pub fn preview(&self, _stream: StreamId, content: &str) -> PreviewResponse {
        let rendered = self.filters.apply_all(content);
        let html = rendered
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .map(|p| format!("<p>{}</p>", html_escape(p.trim()).replace('\n', "<br />")))
            .collect::<Vec<_>>()
            .join("\n");
        PreviewResponse { html }
    }

    /// Caching contract: a window whose end hasn't happened yet is
    /// cacheable until it does; everything else is no-cache.
    pub fn cache_hint(&self, end: Option<Timestamp>) -> CacheHint {
        match end {
            Some(end) => CacheHint::until(end, Timestamp::now()),
            None => CacheHint::no_store(),
        }
    }

    fn to_wire(&self, entries: &[crate::core::ProjectedEntry]) -> Vec<WireEntry> {
        entries
            .iter()
            .map(|e| entry_to_wire(e, &self.filters, &self.config.share_base_url))
            .collect()
    }
}

fn authors_of(author: &Option<AuthorId>, contributors: &[AuthorId]) -> Vec<AuthorId> {
    let mut authors = Vec::with_capacity(1 + contributors.len());
    if let Some(author) = author {
        authors.push(author.clone());
    }
    authors.extend(contributors.iter().cloned());
    authors
}

fn require_entry_id(entry_id: &Option<RecordId>, action: &str) -> Result<RecordId, ApiError> {
    entry_id.ok_or_else(|| ApiError::Invalid(format!("{action} requires an entry_id")))
}

fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
