//! Append idempotency specs
//!
//! Retrying an append with the same event identifier never stores a second
//! copy; a retry with different contents under the same identifier is a
//! distinguished duplicate.

use crate::prelude::*;

#[test]
fn an_exact_retry_stores_exactly_one_record() {
    for (name, engine) in both_engines() {
        let batch = vec![deposit("a-1", 0, 10), deposit("a-1", 1, 20)];
        engine.append_events(&batch).unwrap();
        engine.append_events(&batch).unwrap();

        let events = replay(&engine, "a-1", 0);
        assert_eq!(sequences(&events), [0, 1], "strategy: {name}");
    }
}

#[test]
fn a_reused_identifier_with_different_contents_is_a_duplicate() {
    for (name, engine) in both_engines() {
        engine.append_events(&[deposit("a-1", 0, 10)]).unwrap();

        let imposter = DomainEvent::new(
            "account",
            "a-1",
            1,
            EventPayload::new("Deposited", json!({"amount": 999})),
        )
        .with_event_id("a-1-0");

        let result = engine.append_events(&[imposter]);
        assert!(
            matches!(result, Err(EventStoreError::DuplicateEvent { event_id }) if event_id == "a-1-0"),
            "strategy: {name}"
        );
    }
}

#[test]
fn a_retry_completes_a_half_finished_append() {
    // Crash window of the indexed layout: the event document committed but
    // the index write never happened. The orphan is invisible to replay
    // until the retried append completes the index.
    let (store, engine) = indexed_engine_with_store();
    let event = deposit("a-1", 0, 10);
    let envelope = EventEnvelope::from_domain(&event, &JsonSerializer).unwrap();
    store
        .insert("evt:a-1-0", envelope.to_document().unwrap())
        .unwrap();

    assert!(replay(&engine, "a-1", 0).is_empty());

    engine.append_events(&[event]).unwrap();
    assert_eq!(sequences(&replay(&engine, "a-1", 0)), [0]);
}
