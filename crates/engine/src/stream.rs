// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lazy, flattening replay stream

use crate::engine::EngineConfig;
use crate::strategy::StorageStrategy;
use annal_core::{DomainEvent, EventSerializer, EventStoreError, UpcasterChain};
use std::collections::VecDeque;
use std::sync::Arc;

/// Replay iterator over one aggregate's events.
///
/// Lazily fetches stored records in batches and flattens each record's 0..N
/// decoded events into a single ordered sequence, so batch boundaries are
/// invisible to the consumer. Single-pass: restartable only by asking the
/// engine for a new stream. Dropping the stream between batch fetches is how
/// a long replay is cancelled.
pub struct EventStream {
    strategy: Arc<dyn StorageStrategy>,
    serializer: Arc<dyn EventSerializer>,
    upcasters: Arc<dyn UpcasterChain>,
    aggregate_type: String,
    aggregate_id: String,
    next_sequence: u64,
    batch_size: usize,
    skip_unknown_types: bool,
    skip_corrupt_records: bool,
    pending: VecDeque<Result<DomainEvent, EventStoreError>>,
    exhausted: bool,
    skipped_records: u64,
}

impl EventStream {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        strategy: Arc<dyn StorageStrategy>,
        serializer: Arc<dyn EventSerializer>,
        upcasters: Arc<dyn UpcasterChain>,
        aggregate_type: String,
        aggregate_id: String,
        start_sequence: u64,
        initial: Vec<DomainEvent>,
        config: EngineConfig,
    ) -> Self {
        Self {
            strategy,
            serializer,
            upcasters,
            aggregate_type,
            aggregate_id,
            next_sequence: start_sequence,
            batch_size: config.batch_size.max(1),
            skip_unknown_types: config.skip_unknown_types,
            skip_corrupt_records: config.skip_corrupt_records,
            pending: initial.into_iter().map(Ok).collect(),
            exhausted: false,
            skipped_records: 0,
        }
    }

    /// How many stored records were skipped as corrupt so far. Only ever
    /// non-zero when corrupt-record skipping is configured.
    pub fn skipped_records(&self) -> u64 {
        self.skipped_records
    }

    fn fetch_next_batch(&mut self) {
        let batch = match self.strategy.read_events(
            &self.aggregate_type,
            &self.aggregate_id,
            self.next_sequence,
            self.batch_size,
        ) {
            Ok(batch) => batch,
            Err(e) => {
                self.exhausted = true;
                self.pending.push_back(Err(e));
                return;
            }
        };

        // A short batch means the log has no more stored records.
        if batch.len() < self.batch_size {
            self.exhausted = true;
        }

        for envelope in batch {
            self.next_sequence = envelope.sequence_number + 1;
            match envelope.to_domain_events(
                &*self.serializer,
                &*self.upcasters,
                self.skip_unknown_types,
            ) {
                Ok(events) => self.pending.extend(events.into_iter().map(Ok)),
                Err(EventStoreError::CorruptRecord { record, reason })
                    if self.skip_corrupt_records =>
                {
                    tracing::warn!(
                        aggregate_id = %self.aggregate_id,
                        record = %record,
                        reason = %reason,
                        "skipping corrupt record during replay"
                    );
                    self.skipped_records += 1;
                }
                Err(e) => {
                    self.exhausted = true;
                    self.pending.push_back(Err(e));
                    return;
                }
            }
        }
    }
}

impl Iterator for EventStream {
    type Item = Result<DomainEvent, EventStoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }
            if self.exhausted {
                return None;
            }
            self.fetch_next_batch();
        }
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
