// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strategy-agnostic event store engine

use crate::strategy::{Capabilities, StorageStrategy};
use crate::stream::EventStream;
use crate::token::TrackingToken;
use annal_core::{
    DomainEvent, EventEnvelope, EventSerializer, EventStoreError, UpcasterChain,
};
use std::sync::Arc;

const DEFAULT_BATCH: usize = 100;

/// Engine configuration, injected at construction.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// How many stored records each strategy read fetches at once.
    pub batch_size: usize,
    /// Drop records whose payload type the upcaster chain does not
    /// recognize, instead of failing the replay.
    pub skip_unknown_types: bool,
    /// Skip records that fail to decode during replay, with a warning and a
    /// counter on the stream, instead of failing the replay.
    pub skip_corrupt_records: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH,
            skip_unknown_types: false,
            skip_corrupt_records: false,
        }
    }
}

impl EngineConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_skip_unknown_types(mut self, skip: bool) -> Self {
        self.skip_unknown_types = skip;
        self
    }

    pub fn with_skip_corrupt_records(mut self, skip: bool) -> Self {
        self.skip_corrupt_records = skip;
        self
    }
}

/// One batch of the tracked stream, decoded, with the token to resume after.
#[derive(Debug, Clone)]
pub struct TrackedEvents {
    pub events: Vec<DomainEvent>,
    pub token: TrackingToken,
}

/// Strategy-agnostic orchestrator over one storage strategy.
///
/// Validates and partitions append batches, delegates physical layout to the
/// strategy, and drives replay through the serializer/upcaster boundary. The
/// engine holds no mutable state; concurrent callers share it freely.
pub struct EventStoreEngine {
    strategy: Arc<dyn StorageStrategy>,
    serializer: Arc<dyn EventSerializer>,
    upcasters: Arc<dyn UpcasterChain>,
    config: EngineConfig,
}

impl EventStoreEngine {
    pub fn new(
        strategy: Arc<dyn StorageStrategy>,
        serializer: Arc<dyn EventSerializer>,
        upcasters: Arc<dyn UpcasterChain>,
    ) -> Self {
        Self {
            strategy,
            serializer,
            upcasters,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// What the active strategy supports beyond append and replay. Callers
    /// check this ahead of use instead of failing mid-stream.
    pub fn capabilities(&self) -> Capabilities {
        self.strategy.capabilities()
    }

    /// Append a batch of domain events.
    ///
    /// Events for different aggregates are independent; events for the same
    /// aggregate must arrive in ascending, gapless sequence order, and a
    /// violating batch is rejected before anything is written.
    pub fn append_events(&self, events: &[DomainEvent]) -> Result<(), EventStoreError> {
        for partition in partition_by_aggregate(events)? {
            let envelopes = partition
                .iter()
                .map(|event| EventEnvelope::from_domain(event, &*self.serializer))
                .collect::<Result<Vec<_>, _>>()?;
            self.strategy.append_events(&envelopes)?;
        }
        Ok(())
    }

    /// Store a snapshot of an aggregate's state as of its sequence number.
    /// Later snapshots supersede earlier ones.
    pub fn store_snapshot(&self, snapshot: &DomainEvent) -> Result<(), EventStoreError> {
        let envelope = EventEnvelope::from_domain(snapshot, &*self.serializer)?;
        self.strategy.append_snapshot(&envelope)
    }

    /// Replay an aggregate's events from `from_sequence`, in ascending
    /// sequence order.
    ///
    /// When the strategy supports snapshots and one covers the requested
    /// range, the snapshot's reconstructed state is yielded first and replay
    /// continues after its sequence number. Batch fetches are re-issued
    /// transparently as the stream is consumed.
    pub fn load_events(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        from_sequence: u64,
    ) -> Result<EventStream, EventStoreError> {
        let mut start = from_sequence;
        let mut initial = Vec::new();

        if self.strategy.capabilities().snapshots {
            match self.strategy.read_last_snapshot(aggregate_type, aggregate_id) {
                Ok(Some(snapshot)) if snapshot.sequence_number >= from_sequence => {
                    match snapshot.to_domain_events(
                        &*self.serializer,
                        &*self.upcasters,
                        self.config.skip_unknown_types,
                    ) {
                        Ok(events) => {
                            start = snapshot.sequence_number + 1;
                            initial = events;
                        }
                        // A snapshot is an optimization; the event log stays
                        // the source of truth.
                        Err(e) => tracing::warn!(
                            aggregate_id,
                            error = %e,
                            "ignoring unreadable snapshot, replaying in full"
                        ),
                    }
                }
                Ok(_) => {}
                Err(EventStoreError::CorruptRecord { record, reason }) => tracing::warn!(
                    aggregate_id,
                    record = %record,
                    reason = %reason,
                    "ignoring unreadable snapshot, replaying in full"
                ),
                Err(e) => return Err(e),
            }
        }

        Ok(EventStream::new(
            Arc::clone(&self.strategy),
            Arc::clone(&self.serializer),
            Arc::clone(&self.upcasters),
            aggregate_type.to_string(),
            aggregate_id.to_string(),
            start,
            initial,
            self.config,
        ))
    }

    /// Read the next tracked batch after `token`, for catch-up consumers.
    pub fn load_events_since(
        &self,
        token: TrackingToken,
    ) -> Result<TrackedEvents, EventStoreError> {
        if !self.strategy.capabilities().tracked_stream {
            return Err(EventStoreError::UnsupportedCapability {
                operation: "read_tracked",
            });
        }
        let batch = self.strategy.read_tracked(token, self.config.batch_size)?;
        let mut events = Vec::new();
        for envelope in &batch.envelopes {
            match envelope.to_domain_events(
                &*self.serializer,
                &*self.upcasters,
                self.config.skip_unknown_types,
            ) {
                Ok(decoded) => events.extend(decoded),
                Err(EventStoreError::CorruptRecord { record, reason })
                    if self.config.skip_corrupt_records =>
                {
                    tracing::warn!(
                        record = %record,
                        reason = %reason,
                        "skipping corrupt record in tracked stream"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(TrackedEvents {
            events,
            token: batch.token,
        })
    }
}

/// Split a batch into per-aggregate runs, preserving order, rejecting any
/// run that is not gapless ascending.
fn partition_by_aggregate(
    events: &[DomainEvent],
) -> Result<Vec<Vec<&DomainEvent>>, EventStoreError> {
    let mut partitions: Vec<((&str, &str), Vec<&DomainEvent>)> = Vec::new();
    for event in events {
        let key = (event.aggregate_type.as_str(), event.aggregate_id.as_str());
        match partitions.iter_mut().find(|(k, _)| *k == key) {
            Some((_, partition)) => {
                let last = partition.last().map_or(0, |e| e.sequence_number);
                if event.sequence_number != last + 1 {
                    return Err(EventStoreError::InvalidBatch {
                        reason: format!(
                            "aggregate {}: sequence {} does not follow {}",
                            event.aggregate_id, event.sequence_number, last
                        ),
                    });
                }
                partition.push(event);
            }
            None => partitions.push((key, vec![event])),
        }
    }
    Ok(partitions.into_iter().map(|(_, events)| events).collect())
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
