//! Wire shapes for the endpoint surface.

use serde::{Deserialize, Serialize};

use crate::core::{AuthorId, RecordId, Timestamp};

/// One entry as clients see it. `id` is always the canonical id, never
/// an intermediate record of the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEntry {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub kind: String,
    /// Raw content, as stored (editing round-trips through this).
    pub content: String,
    /// Filtered content for display.
    pub render: String,
    pub css_classes: String,
    pub timestamp: Timestamp,
    pub authors: Vec<AuthorId>,
    /// RFC3339 rendering of `timestamp`.
    pub entry_time: String,
    pub share_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_event: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_event_content: Option<String>,
}

/// Write verbs. Anything else fails deserialization at the routing
/// boundary, which answers 406.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrudAction {
    Insert,
    Update,
    Delete,
    DeleteKey,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrudRequest {
    pub action: CrudAction,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<AuthorId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributor_ids: Vec<AuthorId>,
}

/// Time-windowed entries plus everything a poller needs to schedule its
/// next request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntriesResponse {
    pub entries: Vec<WireEntry>,
    pub latest_timestamp: Option<Timestamp>,
    pub refresh_interval: u64,
    pub pages: u32,
    pub total: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrudResponse {
    pub entries: Vec<WireEntry>,
    /// Always null: the writer re-syncs through its next poll window.
    pub latest_timestamp: Option<Timestamp>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LazyloadResponse {
    pub entries: Vec<WireEntry>,
    /// Visible entries older than this window - drives "load more".
    pub index: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SingleEntryResponse {
    /// One entry, or empty when it is unknown or deleted.
    pub entries: Vec<WireEntry>,
    /// 1-based position in the ascending feed; 0 when absent.
    pub index: usize,
    #[serde(rename = "nextTimestamp")]
    pub next_timestamp: Option<Timestamp>,
    #[serde(rename = "previousTimestamp")]
    pub previous_timestamp: Option<Timestamp>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PagedResponse {
    pub entries: Vec<WireEntry>,
    pub page: u32,
    pub pages: u32,
    pub total: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub html: String,
}

/// How the transport may cache a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheHint {
    pub no_cache: bool,
    /// Seconds the response stays valid, when cacheable.
    pub max_age: Option<u64>,
}

impl CacheHint {
    /// Uncacheable: the response reveals per-user or in-flux state.
    pub fn no_store() -> Self {
        Self {
            no_cache: true,
            max_age: None,
        }
    }

    /// A window whose end hasn't happened yet is immutable until then.
    pub fn until(end: Timestamp, now: Timestamp) -> Self {
        if end > now {
            Self {
                no_cache: false,
                max_age: Some(end.saturating_sub(now)),
            }
        } else {
            Self::no_store()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crud_action_wire_names() {
        assert_eq!(
            serde_json::to_string(&CrudAction::DeleteKey).unwrap(),
            "\"delete_key\""
        );
        assert_eq!(
            serde_json::from_str::<CrudAction>("\"insert\"").unwrap(),
            CrudAction::Insert
        );
        assert!(serde_json::from_str::<CrudAction>("\"destroy\"").is_err());
    }

    #[test]
    fn cache_hint_future_window_is_cacheable() {
        let hint = CacheHint::until(Timestamp::new(1000), Timestamp::new(400));
        assert!(!hint.no_cache);
        assert_eq!(hint.max_age, Some(600));

        let past = CacheHint::until(Timestamp::new(400), Timestamp::new(1000));
        assert!(past.no_cache);
    }

    #[test]
    fn wire_entry_omits_absent_key_fields() {
        let entry = WireEntry {
            id: RecordId::new(1).unwrap(),
            kind: "new".into(),
            content: "hi".into(),
            render: "hi".into(),
            css_classes: "liveline-entry liveline-entry-new".into(),
            timestamp: Timestamp::new(100),
            authors: vec![],
            entry_time: "1970-01-01T00:01:40Z".into(),
            share_link: "#1".into(),
            key_event: None,
            key_event_content: None,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("key_event"));
        assert!(json.contains("\"type\":\"new\""));
    }
}
