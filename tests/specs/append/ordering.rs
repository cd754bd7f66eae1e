//! Append ordering specs
//!
//! Appended batches replay in exactly ascending sequence order, with no
//! duplicates and no gaps, under either storage strategy.

use crate::prelude::*;

#[test]
fn appended_events_replay_in_sequence_order() {
    for (name, engine) in both_engines() {
        engine
            .append_events(&[
                deposit("a-1", 0, 10),
                deposit("a-1", 1, 20),
                deposit("a-1", 2, 30),
            ])
            .unwrap();

        let events = replay(&engine, "a-1", 0);
        assert_eq!(sequences(&events), [0, 1, 2], "strategy: {name}");

        let ids: Vec<_> = events.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, ["a-1-0", "a-1-1", "a-1-2"], "strategy: {name}");
    }
}

#[test]
fn appends_accumulate_across_calls() {
    for (name, engine) in both_engines() {
        engine.append_events(&[deposit("a-1", 0, 1)]).unwrap();
        engine
            .append_events(&[deposit("a-1", 1, 2), deposit("a-1", 2, 3)])
            .unwrap();

        assert_eq!(sequences(&replay(&engine, "a-1", 0)), [0, 1, 2], "strategy: {name}");
    }
}

#[test]
fn a_gapped_batch_is_rejected_before_anything_is_written() {
    for (name, engine) in both_engines() {
        let result = engine.append_events(&[deposit("a-1", 0, 1), deposit("a-1", 2, 2)]);
        assert!(
            matches!(result, Err(EventStoreError::InvalidBatch { .. })),
            "strategy: {name}"
        );
        assert!(replay(&engine, "a-1", 0).is_empty(), "strategy: {name}");
    }
}

#[test]
fn a_descending_batch_is_rejected() {
    for (name, engine) in both_engines() {
        let result = engine.append_events(&[deposit("a-1", 1, 1), deposit("a-1", 0, 2)]);
        assert!(
            matches!(result, Err(EventStoreError::InvalidBatch { .. })),
            "strategy: {name}"
        );
    }
}

#[test]
fn events_for_different_aggregates_may_interleave_in_one_batch() {
    for (name, engine) in both_engines() {
        engine
            .append_events(&[
                deposit("a-1", 0, 1),
                deposit("a-2", 0, 100),
                deposit("a-1", 1, 2),
                deposit("a-2", 1, 200),
            ])
            .unwrap();

        assert_eq!(sequences(&replay(&engine, "a-1", 0)), [0, 1], "strategy: {name}");
        assert_eq!(sequences(&replay(&engine, "a-2", 0)), [0, 1], "strategy: {name}");
    }
}
