//! Replay range specs

use crate::prelude::*;

#[test]
fn replay_from_a_mid_sequence_yields_the_suffix() {
    for (name, engine) in both_engines() {
        let events: Vec<_> = (0..5).map(|n| deposit("a-1", n, n)).collect();
        engine.append_events(&events).unwrap();

        assert_eq!(sequences(&replay(&engine, "a-1", 3)), [3, 4], "strategy: {name}");
    }
}

#[test]
fn replay_past_the_end_is_empty_not_an_error() {
    for (name, engine) in both_engines() {
        engine
            .append_events(&[deposit("a-1", 0, 1), deposit("a-1", 1, 2), deposit("a-1", 2, 3)])
            .unwrap();

        assert!(replay(&engine, "a-1", 5).is_empty(), "strategy: {name}");
    }
}

#[test]
fn an_unknown_aggregate_replays_empty() {
    for (name, engine) in both_engines() {
        assert!(replay(&engine, "never-seen", 0).is_empty(), "strategy: {name}");
    }
}

#[test]
fn batch_size_does_not_change_what_replay_yields() {
    let store = Arc::new(MemoryStore::new());
    let engine = EventStoreEngine::new(
        Arc::new(IndexPerAggregate::new(store)),
        Arc::new(JsonSerializer),
        Arc::new(IdentityChain),
    )
    .with_config(EngineConfig::default().with_batch_size(3));

    let events: Vec<_> = (0..10).map(|n| deposit("a-1", n, n)).collect();
    engine.append_events(&events).unwrap();

    assert_eq!(
        sequences(&replay(&engine, "a-1", 0)),
        (0..10).collect::<Vec<_>>()
    );
}

#[test]
fn orphaned_event_documents_without_an_index_are_invisible() {
    // Crash after the event documents committed but before any index write:
    // the aggregate is logically unknown and replays empty.
    let (store, engine) = indexed_engine_with_store();
    for sequence in 0..3 {
        let envelope =
            EventEnvelope::from_domain(&deposit("a-1", sequence, sequence), &JsonSerializer)
                .unwrap();
        store
            .insert(&format!("evt:a-1-{sequence}"), envelope.to_document().unwrap())
            .unwrap();
    }

    assert!(replay(&engine, "a-1", 0).is_empty());
}
