// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain event model

use crate::id::{EventIdGen, UuidEventIds};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Opaque key/value metadata carried alongside an event payload.
pub type Metadata = serde_json::Map<String, Value>;

/// A typed, serializer-opaque event payload.
///
/// The type name and revision are what the upcaster chain keys on when an
/// older stored schema has to be brought up to the current format.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPayload {
    pub type_name: String,
    pub revision: Option<String>,
    pub value: Value,
}

impl EventPayload {
    pub fn new(type_name: impl Into<String>, value: Value) -> Self {
        Self {
            type_name: type_name.into(),
            revision: None,
            value,
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }
}

/// One domain event in an aggregate's history.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEvent {
    pub aggregate_type: String,
    pub aggregate_id: String,
    /// Unique and gapless per aggregate, strictly increasing by 1 from 0.
    pub sequence_number: u64,
    /// Globally unique across the whole store.
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
    pub metadata: Metadata,
}

impl DomainEvent {
    /// Create an event with a fresh UUID identifier and the current time.
    pub fn new(
        aggregate_type: impl Into<String>,
        aggregate_id: impl Into<String>,
        sequence_number: u64,
        payload: EventPayload,
    ) -> Self {
        Self {
            aggregate_type: aggregate_type.into(),
            aggregate_id: aggregate_id.into(),
            sequence_number,
            event_id: UuidEventIds.next_id(),
            timestamp: Utc::now(),
            payload,
            metadata: Metadata::new(),
        }
    }

    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = event_id.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
