//! Concurrency specs
//!
//! Different aggregates never contend; same-aggregate writers racing for the
//! same sequence number get exactly one winner and a conflict for the loser.

use crate::prelude::*;

#[test]
fn the_losing_writer_at_a_sequence_number_gets_a_conflict() {
    for (name, engine) in both_engines() {
        engine
            .append_events(&[deposit("a-1", 0, 1), deposit("a-1", 1, 2)])
            .unwrap();

        // A writer that loaded the aggregate before the append above lands
        // on a sequence number that is already taken.
        let stale = DomainEvent::new(
            "account",
            "a-1",
            1,
            EventPayload::new("Deposited", json!({"amount": 999})),
        )
        .with_event_id("stale-1");

        match engine.append_events(&[stale]) {
            Err(EventStoreError::SequenceConflict {
                aggregate_id,
                expected,
                found,
            }) => {
                assert_eq!(aggregate_id, "a-1", "strategy: {name}");
                assert_eq!(expected, 2, "strategy: {name}");
                assert_eq!(found, 1, "strategy: {name}");
            }
            other => panic!("strategy {name}: expected sequence conflict, got {other:?}"),
        }

        // The log is exactly what the winner wrote.
        let events = replay(&engine, "a-1", 0);
        assert_eq!(sequences(&events), [0, 1], "strategy: {name}");
        assert_eq!(events[1].event_id, "a-1-1", "strategy: {name}");
    }
}

#[test]
fn concurrent_appends_to_different_aggregates_never_interfere() {
    for (name, engine) in both_engines() {
        let engine = &engine;
        std::thread::scope(|scope| {
            for writer in 0..4u64 {
                scope.spawn(move || {
                    let aggregate_id = format!("w-{writer}");
                    for sequence in 0..25u64 {
                        engine
                            .append_events(&[deposit(&aggregate_id, sequence, sequence)])
                            .unwrap();
                    }
                });
            }
        });

        for writer in 0..4u64 {
            let events = replay(engine, &format!("w-{writer}"), 0);
            assert_eq!(
                sequences(&events),
                (0..25).collect::<Vec<_>>(),
                "strategy: {name}, writer: {writer}"
            );
        }
    }
}

#[test]
fn concurrent_replays_of_the_same_aggregate_agree() {
    let engine = indexed_engine();
    let events: Vec<_> = (0..30).map(|n| deposit("a-1", n, n)).collect();
    engine.append_events(&events).unwrap();

    let engine = &engine;
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(move || sequences(&replay(engine, "a-1", 0))))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), (0..30).collect::<Vec<_>>());
        }
    });
}
