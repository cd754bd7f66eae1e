// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single growing document per aggregate
//!
//! All of an aggregate's envelopes are elements of one array field inside a
//! single document. The first append creates the document with a conditional
//! insert; later appends use the store's atomic array-append, so there is no
//! read-modify-write race on the happy path. The layout is bounded by the
//! store's maximum document size, and snapshots and the tracked stream are
//! declared capability gaps.

use crate::strategy::{
    Capabilities, ConflictClassifier, KeyExistsClassifier, StorageStrategy, TrackedBatch,
};
use crate::token::TrackingToken;
use annal_core::{Document, DocumentStore, EventEnvelope, EventStoreError};
use serde_json::Value;
use std::sync::Arc;

const EVENTS_FIELD: &str = "events";

fn aggregate_key(aggregate_type: &str, aggregate_id: &str) -> String {
    format!("agg:{}:{}", aggregate_type, aggregate_id)
}

fn json_len(value: &Value) -> usize {
    serde_json::to_string(value).map(|s| s.len()).unwrap_or(0)
}

/// Configuration for the single-document layout.
#[derive(Debug, Clone, Copy)]
pub struct SingleDocumentConfig {
    /// Hard ceiling on the serialized aggregate document. Appends that would
    /// push past it are rejected, never truncated.
    pub max_document_bytes: usize,
}

impl Default for SingleDocumentConfig {
    fn default() -> Self {
        Self {
            // Common document-store ceiling: 20 MiB per document.
            max_document_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Strategy keeping one growing document per aggregate.
pub struct SingleDocumentPerAggregate {
    store: Arc<dyn DocumentStore>,
    classifier: Box<dyn ConflictClassifier>,
    config: SingleDocumentConfig,
}

impl SingleDocumentPerAggregate {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            classifier: Box::new(KeyExistsClassifier),
            config: SingleDocumentConfig::default(),
        }
    }

    /// Replace the store-specific conflict predicate.
    pub fn with_classifier(mut self, classifier: impl ConflictClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn with_config(mut self, config: SingleDocumentConfig) -> Self {
        self.config = config;
        self
    }

    fn append_batch(
        &self,
        key: &str,
        envelopes: &[EventEnvelope],
        retry_on_create_race: bool,
    ) -> Result<(), EventStoreError> {
        let aggregate_id = &envelopes[0].aggregate_id;
        let existing_doc = self
            .store
            .get(key)
            .map_err(EventStoreError::StoreUnavailable)?;
        let existing = match &existing_doc {
            Some(doc) => Some(read_events_array(doc, key)?),
            None => None,
        };

        // The array-append primitive is not duplicate-safe by itself, so the
        // idempotency and sequence guards are emulated against the current
        // array contents.
        let stored = existing.as_deref().unwrap_or_default();
        let mut fresh = Vec::new();
        for envelope in envelopes {
            let value = Value::Object(envelope.to_document()?);
            if stored.contains(&value) {
                // Exact retry of an already-stored event.
                continue;
            }
            if stored
                .iter()
                .any(|v| stored_event_id(v) == Some(&envelope.event_id))
            {
                return Err(EventStoreError::DuplicateEvent {
                    event_id: envelope.event_id.clone(),
                });
            }
            let expected = next_sequence(stored) + fresh.len() as u64;
            if envelope.sequence_number != expected {
                return Err(EventStoreError::SequenceConflict {
                    aggregate_id: aggregate_id.clone(),
                    expected,
                    found: envelope.sequence_number,
                });
            }
            fresh.push(value);
        }
        if fresh.is_empty() {
            return Ok(());
        }

        // Ceiling check before any mutation, so a rejected append leaves the
        // document unchanged.
        let current_bytes = existing_doc
            .as_ref()
            .map(|doc| json_len(&Value::Object(doc.clone())))
            .unwrap_or(0);
        let projected = current_bytes + fresh.iter().map(json_len).sum::<usize>();
        if projected > self.config.max_document_bytes {
            return Err(EventStoreError::LogTooLarge {
                aggregate_id: aggregate_id.clone(),
                limit_bytes: self.config.max_document_bytes,
            });
        }

        match existing {
            None => {
                let mut document = Document::new();
                document.insert(EVENTS_FIELD.to_string(), Value::Array(fresh));
                match self.store.insert(key, document) {
                    Ok(()) => Ok(()),
                    Err(e) if self.classifier.is_conflict(&e) => {
                        // Another writer created the document first. Re-read
                        // once and re-run the guards against what it wrote.
                        if retry_on_create_race {
                            self.append_batch(key, envelopes, false)
                        } else {
                            Err(EventStoreError::SequenceConflict {
                                aggregate_id: aggregate_id.clone(),
                                expected: 0,
                                found: envelopes[0].sequence_number,
                            })
                        }
                    }
                    Err(e) => Err(EventStoreError::StoreUnavailable(e)),
                }
            }
            Some(_) => {
                for value in fresh {
                    self.store
                        .array_append(key, EVENTS_FIELD, value)
                        .map_err(EventStoreError::StoreUnavailable)?;
                }
                Ok(())
            }
        }
    }
}

fn read_events_array(document: &Document, key: &str) -> Result<Vec<Value>, EventStoreError> {
    match document.get(EVENTS_FIELD) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(_) => Err(EventStoreError::corrupt(key, "events field is not an array")),
    }
}

fn stored_event_id(value: &Value) -> Option<&str> {
    value.get("eventIdentifier").and_then(Value::as_str)
}

fn stored_sequence(value: &Value) -> Option<u64> {
    value.get("sequenceNumber").and_then(Value::as_u64)
}

fn next_sequence(stored: &[Value]) -> u64 {
    stored
        .iter()
        .filter_map(stored_sequence)
        .max()
        .map_or(0, |seq| seq + 1)
}

impl StorageStrategy for SingleDocumentPerAggregate {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            snapshots: false,
            tracked_stream: false,
        }
    }

    fn append_events(&self, envelopes: &[EventEnvelope]) -> Result<(), EventStoreError> {
        let Some(first) = envelopes.first() else {
            return Ok(());
        };
        let key = aggregate_key(&first.aggregate_type, &first.aggregate_id);
        self.append_batch(&key, envelopes, true)?;
        tracing::debug!(
            aggregate_id = %first.aggregate_id,
            count = envelopes.len(),
            "events appended"
        );
        Ok(())
    }

    fn read_events(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        from_sequence: u64,
        batch_size: usize,
    ) -> Result<Vec<EventEnvelope>, EventStoreError> {
        let key = aggregate_key(aggregate_type, aggregate_id);
        let document = match self
            .store
            .get(&key)
            .map_err(EventStoreError::StoreUnavailable)?
        {
            Some(doc) => doc,
            None => return Ok(Vec::new()),
        };

        // The whole document is fetched and filtered client-side; this
        // layout has no server-side range projection, so the batch size only
        // bounds what is returned, not what is read.
        let mut envelopes = Vec::new();
        for value in read_events_array(&document, &key)? {
            let element = match value {
                Value::Object(map) => map,
                _ => return Err(EventStoreError::corrupt(&key, "non-object event element")),
            };
            let envelope = EventEnvelope::from_document(&element)?;
            if envelope.sequence_number >= from_sequence {
                envelopes.push(envelope);
            }
            if envelopes.len() == batch_size {
                break;
            }
        }
        Ok(envelopes)
    }

    fn append_snapshot(&self, _snapshot: &EventEnvelope) -> Result<(), EventStoreError> {
        Err(EventStoreError::UnsupportedCapability {
            operation: "append_snapshot",
        })
    }

    fn read_last_snapshot(
        &self,
        _aggregate_type: &str,
        _aggregate_id: &str,
    ) -> Result<Option<EventEnvelope>, EventStoreError> {
        Err(EventStoreError::UnsupportedCapability {
            operation: "read_last_snapshot",
        })
    }

    fn read_tracked(
        &self,
        _token: TrackingToken,
        _batch_size: usize,
    ) -> Result<TrackedBatch, EventStoreError> {
        Err(EventStoreError::UnsupportedCapability {
            operation: "read_tracked",
        })
    }
}

#[cfg(test)]
#[path = "single_tests.rs"]
mod tests;
