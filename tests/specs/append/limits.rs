//! Document size ceiling specs
//!
//! The single-document layout is bounded by the store's maximum document
//! size; an append that would cross it fails loudly and changes nothing.

use crate::prelude::*;

fn sized_engine(max_document_bytes: usize) -> EventStoreEngine {
    let store = Arc::new(MemoryStore::new());
    let strategy = SingleDocumentPerAggregate::new(store)
        .with_config(SingleDocumentConfig { max_document_bytes });
    EventStoreEngine::new(
        Arc::new(strategy),
        Arc::new(JsonSerializer),
        Arc::new(IdentityChain),
    )
}

#[test]
fn an_over_ceiling_append_fails_and_the_log_is_unchanged() {
    let engine = sized_engine(600);
    engine
        .append_events(&[deposit("a-1", 0, 1), deposit("a-1", 1, 2)])
        .unwrap();
    let before = replay(&engine, "a-1", 0);

    let result = engine.append_events(&[deposit("a-1", 2, 3)]);
    assert!(matches!(
        result,
        Err(EventStoreError::LogTooLarge {
            limit_bytes: 600,
            ..
        })
    ));
    assert_eq!(replay(&engine, "a-1", 0), before);
}

#[test]
fn the_ceiling_is_per_aggregate() {
    let engine = sized_engine(600);
    engine
        .append_events(&[deposit("a-1", 0, 1), deposit("a-1", 1, 2)])
        .unwrap();

    // Another aggregate's log still has headroom.
    engine.append_events(&[deposit("a-2", 0, 1)]).unwrap();
    assert_eq!(sequences(&replay(&engine, "a-2", 0)), [0]);
}

#[test]
fn the_indexed_layout_has_no_document_ceiling() {
    let engine = indexed_engine();
    let events: Vec<_> = (0..200).map(|n| deposit("a-1", n, n)).collect();
    engine.append_events(&events).unwrap();
    assert_eq!(replay(&engine, "a-1", 0).len(), 200);
}
