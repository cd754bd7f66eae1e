// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage strategy contract
//!
//! A strategy owns the physical document layout and the append/read
//! algorithms on top of the document-store primitives. Callers pick one at
//! construction; the engine is otherwise strategy-agnostic. Not every layout
//! supports every operation, so the capability set is queryable ahead of use.

pub mod indexed;
pub mod single;

use crate::token::TrackingToken;
use annal_core::{DocumentError, EventEnvelope, EventStoreError};

/// The operations a strategy implements beyond plain append and replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub snapshots: bool,
    pub tracked_stream: bool,
}

/// One batch of the global tracked stream, with the token to resume after it.
#[derive(Debug, Clone)]
pub struct TrackedBatch {
    pub envelopes: Vec<EventEnvelope>,
    pub token: TrackingToken,
}

/// Decides whether a document-store failure signals a duplicate key or an
/// optimistic-concurrency conflict, as opposed to a transport failure.
///
/// The condition is store-specific; callers wrapping a real backend supply
/// their own predicate at strategy construction.
pub trait ConflictClassifier: Send + Sync {
    fn is_conflict(&self, error: &DocumentError) -> bool;
}

/// Default classifier: an insert into an existing key is a conflict, nothing
/// else is.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyExistsClassifier;

impl ConflictClassifier for KeyExistsClassifier {
    fn is_conflict(&self, error: &DocumentError) -> bool {
        matches!(error, DocumentError::AlreadyExists { .. })
    }
}

/// Physical storage layout for event logs.
///
/// `append_events` receives the envelopes of a single aggregate in ascending,
/// gapless sequence order; the engine validates and partitions batches before
/// delegating here.
pub trait StorageStrategy: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    /// Persist one aggregate's envelopes. Retrying an append whose events
    /// were already durably stored is a no-op.
    fn append_events(&self, envelopes: &[EventEnvelope]) -> Result<(), EventStoreError>;

    /// Read one batch of an aggregate's envelopes starting at
    /// `from_sequence`, in ascending sequence order.
    fn read_events(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        from_sequence: u64,
        batch_size: usize,
    ) -> Result<Vec<EventEnvelope>, EventStoreError>;

    /// Store a snapshot envelope, superseding any earlier snapshot of the
    /// same aggregate.
    fn append_snapshot(&self, snapshot: &EventEnvelope) -> Result<(), EventStoreError>;

    fn read_last_snapshot(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> Result<Option<EventEnvelope>, EventStoreError>;

    /// Read the next batch of the global tracked stream after `token`.
    fn read_tracked(
        &self,
        token: TrackingToken,
        batch_size: usize,
    ) -> Result<TrackedBatch, EventStoreError>;
}
