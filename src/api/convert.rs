//! Projected entry -> wire entry.

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::core::ProjectedEntry;
use crate::filter::FilterRegistry;

use super::schema::WireEntry;

const CSS_BASE: &str = "liveline-entry";
const CSS_KEY_EVENT: &str = "liveline-key-event";

pub fn entry_to_wire(
    entry: &ProjectedEntry,
    filters: &FilterRegistry,
    share_base_url: &str,
) -> WireEntry {
    let render = filters.apply_all(&entry.content);
    let key_event = filters
        .get("key_command")
        .is_some_and(|f| f.matches(&entry.content));

    let mut css_classes = format!("{CSS_BASE} {CSS_BASE}-{}", entry.kind);
    if key_event {
        css_classes.push(' ');
        css_classes.push_str(CSS_KEY_EVENT);
    }

    WireEntry {
        id: entry.canonical_id,
        kind: entry.kind.as_str().to_string(),
        content: entry.content.clone(),
        render: render.clone(),
        css_classes,
        timestamp: entry.created_at,
        authors: entry.authors.clone(),
        entry_time: rfc3339(entry.created_at.get()),
        share_link: format!("{share_base_url}#{}", entry.canonical_id),
        key_event: key_event.then_some(true),
        key_event_content: key_event.then_some(render),
    }
}

fn rfc3339(unix_secs: u64) -> String {
    OffsetDateTime::from_unix_timestamp(unix_secs as i64)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
        .format(&Rfc3339)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RecordId, RecordKind, Timestamp};

    fn entry(content: &str) -> ProjectedEntry {
        ProjectedEntry {
            canonical_id: RecordId::new(7).unwrap(),
            kind: RecordKind::New,
            content: content.into(),
            created_at: Timestamp::new(1700000000),
            last_modified_at: Timestamp::new(1700000000),
            authors: vec![],
            visible: true,
        }
    }

    #[test]
    fn plain_entry_converts_without_key_fields() {
        let filters = FilterRegistry::with_defaults();
        let wire = entry_to_wire(&entry("hello"), &filters, "https://example.org/live");

        assert_eq!(wire.id.get(), 7);
        assert_eq!(wire.kind, "new");
        assert_eq!(wire.render, "hello");
        assert_eq!(wire.share_link, "https://example.org/live#7");
        assert_eq!(wire.css_classes, "liveline-entry liveline-entry-new");
        assert!(wire.key_event.is_none());
        assert!(wire.entry_time.starts_with("2023-"));
    }

    #[test]
    fn key_command_entry_is_flagged_and_stripped() {
        let filters = FilterRegistry::with_defaults();
        let wire = entry_to_wire(&entry("/key Kickoff"), &filters, "");

        assert_eq!(wire.content, "/key Kickoff");
        assert_eq!(wire.render, "Kickoff");
        assert_eq!(wire.key_event, Some(true));
        assert_eq!(wire.key_event_content.as_deref(), Some("Kickoff"));
        assert!(wire.css_classes.contains("liveline-key-event"));
    }
}
