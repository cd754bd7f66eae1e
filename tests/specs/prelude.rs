//! Shared harness for the behavioral specs.

pub use annal_core::{
    DocumentStore, DomainEvent, EventEnvelope, EventPayload, EventStoreError, IdentityChain,
    JsonSerializer,
};
pub use annal_engine::{
    EngineConfig, EventStoreEngine, IndexPerAggregate, SingleDocumentConfig,
    SingleDocumentPerAggregate, TrackingToken,
};
pub use annal_storage::{FileStore, MemoryStore};
pub use serde_json::json;
pub use std::sync::Arc;

/// Engine over the index + per-event-document layout, with a handle on the
/// backing store for crash simulation.
pub fn indexed_engine_with_store() -> (Arc<MemoryStore>, EventStoreEngine) {
    let store = Arc::new(MemoryStore::new());
    let engine = EventStoreEngine::new(
        Arc::new(IndexPerAggregate::new(store.clone())),
        Arc::new(JsonSerializer),
        Arc::new(IdentityChain),
    );
    (store, engine)
}

pub fn indexed_engine() -> EventStoreEngine {
    indexed_engine_with_store().1
}

/// Engine over the single-growing-document layout.
pub fn single_doc_engine() -> EventStoreEngine {
    let store = Arc::new(MemoryStore::new());
    EventStoreEngine::new(
        Arc::new(SingleDocumentPerAggregate::new(store)),
        Arc::new(JsonSerializer),
        Arc::new(IdentityChain),
    )
}

/// Both strategies behind the same engine API, for specs that must hold
/// regardless of layout.
pub fn both_engines() -> Vec<(&'static str, EventStoreEngine)> {
    vec![
        ("indexed", indexed_engine()),
        ("single-document", single_doc_engine()),
    ]
}

/// A deposit event with a deterministic identifier.
pub fn deposit(aggregate_id: &str, sequence: u64, amount: u64) -> DomainEvent {
    DomainEvent::new(
        "account",
        aggregate_id,
        sequence,
        EventPayload::new("Deposited", json!({"amount": amount})),
    )
    .with_event_id(format!("{aggregate_id}-{sequence}"))
}

/// Replay an aggregate fully into a vector, failing the spec on any error.
pub fn replay(engine: &EventStoreEngine, aggregate_id: &str, from: u64) -> Vec<DomainEvent> {
    engine
        .load_events("account", aggregate_id, from)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

pub fn sequences(events: &[DomainEvent]) -> Vec<u64> {
    events.iter().map(|e| e.sequence_number).collect()
}
