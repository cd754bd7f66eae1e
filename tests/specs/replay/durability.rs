//! Durability specs
//!
//! Logs written through the file-backed store survive a full reopen: a new
//! engine over the same directory replays identical history.

use crate::prelude::*;

fn file_engine(path: &std::path::Path) -> EventStoreEngine {
    let store = Arc::new(FileStore::open(path).unwrap());
    EventStoreEngine::new(
        Arc::new(IndexPerAggregate::new(store)),
        Arc::new(JsonSerializer),
        Arc::new(IdentityChain),
    )
}

#[test]
fn replay_survives_an_engine_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let engine = file_engine(dir.path());
        engine
            .append_events(&[
                deposit("a-1", 0, 10),
                deposit("a-1", 1, 20),
                deposit("a-2", 0, 5),
            ])
            .unwrap();
    }

    let engine = file_engine(dir.path());
    assert_eq!(sequences(&replay(&engine, "a-1", 0)), [0, 1]);
    assert_eq!(sequences(&replay(&engine, "a-2", 0)), [0]);
}

#[test]
fn the_tracked_stream_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let token = {
        let engine = file_engine(dir.path());
        engine.append_events(&[deposit("a-1", 0, 1)]).unwrap();
        engine
            .load_events_since(TrackingToken::start())
            .unwrap()
            .token
    };

    let engine = file_engine(dir.path());
    engine.append_events(&[deposit("a-1", 1, 2)]).unwrap();

    // A token minted before the restart still resumes in the right place.
    let batch = engine.load_events_since(token).unwrap();
    assert_eq!(batch.events.len(), 1);
    assert_eq!(batch.events[0].sequence_number, 1);
}

#[test]
fn snapshots_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let engine = file_engine(dir.path());
        let events: Vec<_> = (0..4).map(|n| deposit("a-1", n, 10)).collect();
        engine.append_events(&events).unwrap();
        let snapshot = DomainEvent::new(
            "account",
            "a-1",
            1,
            EventPayload::new("AccountState", json!({"balance": 20})),
        );
        engine.store_snapshot(&snapshot).unwrap();
    }

    let engine = file_engine(dir.path());
    let events = replay(&engine, "a-1", 0);
    assert_eq!(events[0].payload.type_name, "AccountState");
    assert_eq!(sequences(&events), [1, 2, 3]);
}
