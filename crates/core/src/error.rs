// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for event-store operations

use crate::store::DocumentError;
use thiserror::Error;

/// Distinguished outcomes of store operations.
///
/// Callers branch on the kind to decide between retry and abort; none of
/// these may be collapsed into a generic failure.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// The event identifier is already stored with different contents. An
    /// exact retry of an already-applied append is not an error and never
    /// produces this.
    #[error("event {event_id} already stored with different contents")]
    DuplicateEvent { event_id: String },

    /// A concurrent writer advanced the aggregate past the expected next
    /// sequence number. Reload current state and retry.
    #[error("sequence conflict on aggregate {aggregate_id}: expected {expected}, found {found}")]
    SequenceConflict {
        aggregate_id: String,
        expected: u64,
        found: u64,
    },

    /// The aggregate document would exceed the configured size ceiling.
    /// Fatal for this append; compaction or migration happens elsewhere.
    #[error("event log for aggregate {aggregate_id} would exceed {limit_bytes} bytes")]
    LogTooLarge {
        aggregate_id: String,
        limit_bytes: usize,
    },

    /// The active storage strategy does not implement this operation.
    #[error("{operation} is not supported by this storage strategy")]
    UnsupportedCapability { operation: &'static str },

    /// Transport or I/O failure talking to the document store. Retryable per
    /// caller policy; never retried internally.
    #[error("document store unavailable: {0}")]
    StoreUnavailable(#[source] DocumentError),

    /// A stored record could not be decoded.
    #[error("corrupt record {record}: {reason}")]
    CorruptRecord { record: String, reason: String },

    /// The append batch violates per-aggregate ordering; rejected before any
    /// write is attempted.
    #[error("invalid append batch: {reason}")]
    InvalidBatch { reason: String },
}

impl EventStoreError {
    pub fn corrupt(record: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::CorruptRecord {
            record: record.into(),
            reason: reason.to_string(),
        }
    }
}
