//! End-to-end projection behavior over a live store.

use liveline::core::{Limits, StreamId, Timestamp};
use liveline::store::{EntryDraft, EntryStore};

fn stream(raw: u64) -> StreamId {
    StreamId::new(raw).unwrap()
}

fn seeded_store() -> (EntryStore, StreamId) {
    let store = EntryStore::new(Limits::default());
    let s = stream(1);
    for (ts, text) in [(100, "A"), (200, "B"), (300, "C")] {
        store
            .insert(s, EntryDraft::text(text).at(Timestamp::new(ts)))
            .unwrap();
    }
    (store, s)
}

#[test]
fn window_edit_delete_scenario() {
    let (store, s) = seeded_store();

    // initial window: inclusive bounds catch B and C
    let window = store
        .get_between(s, Timestamp::new(150), Some(Timestamp::new(300)))
        .unwrap();
    assert_eq!(
        window.iter().map(|e| e.content.as_str()).collect::<Vec<_>>(),
        vec!["B", "C"]
    );
    let b_id = window[0].canonical_id;
    let c_id = window[1].canonical_id;

    // B edited later: same canonical id, same display time, new content
    store
        .update(s, b_id, EntryDraft::text("B2").at(Timestamp::new(900)))
        .unwrap();
    let window = store
        .get_between(s, Timestamp::new(150), Some(Timestamp::new(300)))
        .unwrap();
    assert_eq!(
        window.iter().map(|e| e.content.as_str()).collect::<Vec<_>>(),
        vec!["B2", "C"]
    );
    assert_eq!(window[0].canonical_id, b_id);
    assert_eq!(window[0].created_at, Timestamp::new(200));
    assert_eq!(window[0].last_modified_at, Timestamp::new(900));

    // C deleted: gone from the same window, no tombstone served
    store.delete(s, c_id).unwrap();
    let window = store
        .get_between(s, Timestamp::new(150), Some(Timestamp::new(300)))
        .unwrap();
    assert_eq!(
        window.iter().map(|e| e.content.as_str()).collect::<Vec<_>>(),
        vec!["B2"]
    );
}

#[test]
fn repeated_projection_is_byte_identical() {
    let (store, s) = seeded_store();

    let first = store.get_between(s, Timestamp::ZERO, None).unwrap();
    let second = store.get_between(s, Timestamp::ZERO, None).unwrap();
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
}

#[test]
fn chain_of_edits_collapses_to_one_entry() {
    let store = EntryStore::new(Limits::default());
    let s = stream(9);

    let root = store
        .insert(s, EntryDraft::text("v1").at(Timestamp::new(100)))
        .unwrap();
    store
        .update(s, root.id, EntryDraft::text("v2").at(Timestamp::new(200)))
        .unwrap();
    store
        .update(s, root.id, EntryDraft::text("v3").at(Timestamp::new(300)))
        .unwrap();

    let feed = store.flattened(s).unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].canonical_id, root.id);
    assert_eq!(feed[0].content, "v3");

    // deleting the chain hides it from every read
    store.delete(s, root.id).unwrap();
    assert!(store.flattened(s).unwrap().is_empty());
    assert!(store.get_by_id(s, root.id).unwrap().is_none());
    assert!(store
        .get_between(s, Timestamp::ZERO, None)
        .unwrap()
        .is_empty());
}

#[test]
fn streams_do_not_bleed_into_each_other() {
    let store = EntryStore::new(Limits::default());
    let s1 = stream(1);
    let s2 = stream(2);

    let mine = store
        .insert(s1, EntryDraft::text("mine").at(Timestamp::new(100)))
        .unwrap();
    store
        .insert(s2, EntryDraft::text("theirs").at(Timestamp::new(100)))
        .unwrap();

    assert_eq!(store.flattened(s1).unwrap().len(), 1);
    assert_eq!(store.flattened(s2).unwrap().len(), 1);
    assert!(store.get_by_id(s2, mine.id).unwrap().is_none());

    // an append to one stream leaves the other's cache warm and correct
    store
        .insert(s2, EntryDraft::text("more").at(Timestamp::new(200)))
        .unwrap();
    assert_eq!(store.flattened(s1).unwrap().len(), 1);
    assert_eq!(store.flattened(s2).unwrap().len(), 2);
}
