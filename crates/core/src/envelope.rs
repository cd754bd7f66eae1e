// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persisted envelope form of a domain event and its codec

use crate::error::EventStoreError;
use crate::event::{DomainEvent, EventPayload};
use crate::serializer::{EventSerializer, Representation, SerializedObject};
use crate::store::Document;
use crate::upcaster::UpcasterChain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The persisted, serializer-opaque record of one domain event.
///
/// Immutable once written. The field names are the persisted property names;
/// the timestamp is stored as an RFC 3339 string so it round-trips without
/// any schema knowledge on the reading side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub aggregate_type: String,
    #[serde(rename = "aggregateIdentifier")]
    pub aggregate_id: String,
    #[serde(rename = "sequenceNumber")]
    pub sequence_number: u64,
    #[serde(rename = "eventIdentifier")]
    pub event_id: String,
    #[serde(rename = "timeStamp")]
    pub timestamp: String,
    #[serde(rename = "serializedPayload")]
    pub payload: Representation,
    #[serde(rename = "payloadType")]
    pub payload_type: String,
    #[serde(rename = "payloadRevision")]
    pub payload_revision: Option<String>,
    #[serde(rename = "serializedMetaData")]
    pub metadata: Representation,
}

impl EventEnvelope {
    /// Serialize a domain event into its envelope form.
    ///
    /// The serialization target is selected here, once, for both payload and
    /// metadata, and the payload type name and revision are stamped for
    /// forward-compatible decoding.
    pub fn from_domain(
        event: &DomainEvent,
        serializer: &dyn EventSerializer,
    ) -> Result<Self, EventStoreError> {
        let payload = serializer
            .serialize(&event.payload.value)
            .map_err(|e| EventStoreError::InvalidBatch {
                reason: format!("event {}: payload does not serialize: {}", event.event_id, e),
            })?;
        let metadata = serializer
            .serialize(&Value::Object(event.metadata.clone()))
            .map_err(|e| EventStoreError::InvalidBatch {
                reason: format!("event {}: metadata does not serialize: {}", event.event_id, e),
            })?;

        Ok(Self {
            aggregate_type: event.aggregate_type.clone(),
            aggregate_id: event.aggregate_id.clone(),
            sequence_number: event.sequence_number,
            event_id: event.event_id.clone(),
            timestamp: event.timestamp.to_rfc3339(),
            payload,
            payload_type: event.payload.type_name.clone(),
            payload_revision: event.payload.revision.clone(),
            metadata,
        })
    }

    /// Decode this envelope back into domain events.
    ///
    /// The upcaster chain is applied first, so one stored record may expand
    /// into several current-format events or collapse to none. When
    /// `skip_unknown_types` is set, records whose payload type the chain does
    /// not recognize are dropped with a warning instead of failing the whole
    /// replay.
    pub fn to_domain_events(
        &self,
        serializer: &dyn EventSerializer,
        upcasters: &dyn UpcasterChain,
        skip_unknown_types: bool,
    ) -> Result<Vec<DomainEvent>, EventStoreError> {
        if !upcasters.recognizes(&self.payload_type, self.payload_revision.as_deref()) {
            if skip_unknown_types {
                tracing::warn!(
                    event_id = %self.event_id,
                    payload_type = %self.payload_type,
                    "skipping record with unrecognized payload type"
                );
                return Ok(Vec::new());
            }
            return Err(EventStoreError::corrupt(
                &self.event_id,
                format!("unrecognized payload type {}", self.payload_type),
            ));
        }

        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map_err(|e| EventStoreError::corrupt(&self.event_id, e))?
            .with_timezone(&Utc);

        let metadata = match serializer
            .deserialize(&self.metadata)
            .map_err(|e| EventStoreError::corrupt(&self.event_id, e))?
        {
            Value::Object(map) => map,
            other => {
                return Err(EventStoreError::corrupt(
                    &self.event_id,
                    format!("metadata is not a map: {}", other),
                ))
            }
        };

        let stored = SerializedObject {
            data: self.payload.clone(),
            type_name: self.payload_type.clone(),
            revision: self.payload_revision.clone(),
        };

        let mut events = Vec::new();
        for (index, object) in upcasters.upcast(stored).into_iter().enumerate() {
            let value = serializer
                .deserialize(&object.data)
                .map_err(|e| EventStoreError::corrupt(&self.event_id, e))?;
            // Expanded events keep the stored record's sequence number; event
            // identifiers past the first get an index suffix to stay unique.
            let event_id = if index == 0 {
                self.event_id.clone()
            } else {
                format!("{}/{}", self.event_id, index)
            };
            events.push(DomainEvent {
                aggregate_type: self.aggregate_type.clone(),
                aggregate_id: self.aggregate_id.clone(),
                sequence_number: self.sequence_number,
                event_id,
                timestamp,
                payload: EventPayload {
                    type_name: object.type_name,
                    revision: object.revision,
                    value,
                },
                metadata: metadata.clone(),
            });
        }
        Ok(events)
    }

    /// The envelope as a storable document.
    pub fn to_document(&self) -> Result<Document, EventStoreError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => Err(EventStoreError::InvalidBatch {
                reason: format!("event {}: envelope does not serialize", self.event_id),
            }),
        }
    }

    /// Decode an envelope from a stored document.
    pub fn from_document(document: &Document) -> Result<Self, EventStoreError> {
        let record = document
            .get("eventIdentifier")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
            .to_string();
        serde_json::from_value(Value::Object(document.clone()))
            .map_err(|e| EventStoreError::corrupt(record, e))
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
