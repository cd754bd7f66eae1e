// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Index + per-event document layout
//!
//! Each envelope lives in its own immutable document keyed by its event
//! identifier; a mutable index document per aggregate holds the ordered list
//! of event-document keys. The index is only written after the event
//! document, so a crash between the two leaves an orphaned event document
//! (never referenced, harmless) but never a dangling reference.

use crate::strategy::{
    Capabilities, ConflictClassifier, KeyExistsClassifier, StorageStrategy, TrackedBatch,
};
use crate::token::TrackingToken;
use annal_core::{Document, DocumentError, DocumentStore, EventEnvelope, EventStoreError};
use serde_json::Value;
use std::sync::Arc;

const REFS_FIELD: &str = "refs";
const TRACKED_KEY: &str = "trk:events";

fn event_key(event_id: &str) -> String {
    format!("evt:{}", event_id)
}

fn index_key(aggregate_type: &str, aggregate_id: &str) -> String {
    format!("idx:{}:{}", aggregate_type, aggregate_id)
}

fn snapshot_key(aggregate_type: &str, aggregate_id: &str) -> String {
    format!("snp:{}:{}", aggregate_type, aggregate_id)
}

/// Strategy storing an index document plus one document per event.
///
/// Same-aggregate writers race on the index read-modify-upsert; the sequence
/// check turns a materialized race into a `SequenceConflict`, but the window
/// between read and upsert stays open, so such writers must be serialized by
/// the caller or retried on conflict.
pub struct IndexPerAggregate {
    store: Arc<dyn DocumentStore>,
    classifier: Box<dyn ConflictClassifier>,
}

impl IndexPerAggregate {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            classifier: Box::new(KeyExistsClassifier),
        }
    }

    /// Replace the store-specific conflict predicate.
    pub fn with_classifier(mut self, classifier: impl ConflictClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    fn append_one(&self, envelope: &EventEnvelope) -> Result<(), EventStoreError> {
        let event_key = event_key(&envelope.event_id);
        let document = envelope.to_document()?;

        // The conditional insert on the event document is the idempotency
        // guard for retried appends.
        let retried = match self.store.insert(&event_key, document.clone()) {
            Ok(()) => false,
            Err(e) if self.classifier.is_conflict(&e) => {
                let existing = self
                    .store
                    .get(&event_key)
                    .map_err(EventStoreError::StoreUnavailable)?;
                if existing.as_ref() != Some(&document) {
                    return Err(EventStoreError::DuplicateEvent {
                        event_id: envelope.event_id.clone(),
                    });
                }
                // Exact retry of an already-stored event; fall through to
                // complete whatever index writes the first attempt missed.
                true
            }
            Err(e) => return Err(EventStoreError::StoreUnavailable(e)),
        };

        let index_key = index_key(&envelope.aggregate_type, &envelope.aggregate_id);
        let index_doc = self
            .store
            .get(&index_key)
            .map_err(EventStoreError::StoreUnavailable)?;
        let mut refs = match &index_doc {
            Some(doc) => read_refs(doc, &index_key)?,
            None => Vec::new(),
        };

        let ref_value = Value::String(event_key.clone());
        if refs.contains(&ref_value) {
            if retried {
                self.complete_tracked(&event_key)?;
            }
            return Ok(());
        }

        // Ref positions are sequence numbers, so the next free position is
        // the expected sequence. A concurrent writer that already landed
        // there shows up here as a conflict.
        let expected = refs.len() as u64;
        if envelope.sequence_number != expected {
            return Err(EventStoreError::SequenceConflict {
                aggregate_id: envelope.aggregate_id.clone(),
                expected,
                found: envelope.sequence_number,
            });
        }

        refs.push(ref_value);
        let mut updated = index_doc.unwrap_or_default();
        updated.insert(REFS_FIELD.to_string(), Value::Array(refs));
        self.store
            .upsert(&index_key, updated)
            .map_err(EventStoreError::StoreUnavailable)?;

        tracing::debug!(
            aggregate_id = %envelope.aggregate_id,
            sequence = envelope.sequence_number,
            "event appended"
        );

        // Tracked stream last: an event becomes visible to catch-up
        // consumers only once fully indexed.
        if retried {
            self.complete_tracked(&event_key)
        } else {
            self.tracked_append(&event_key)
        }
    }

    fn tracked_append(&self, event_key: &str) -> Result<(), EventStoreError> {
        let value = Value::String(event_key.to_string());
        match self.store.array_append(TRACKED_KEY, REFS_FIELD, value.clone()) {
            Ok(()) => Ok(()),
            Err(DocumentError::NotFound { .. }) => {
                let mut doc = Document::new();
                doc.insert(REFS_FIELD.to_string(), Value::Array(vec![value.clone()]));
                match self.store.insert(TRACKED_KEY, doc) {
                    Ok(()) => Ok(()),
                    // Lost the creation race; the document exists now.
                    Err(e) if self.classifier.is_conflict(&e) => self
                        .store
                        .array_append(TRACKED_KEY, REFS_FIELD, value)
                        .map_err(EventStoreError::StoreUnavailable),
                    Err(e) => Err(EventStoreError::StoreUnavailable(e)),
                }
            }
            Err(e) => Err(EventStoreError::StoreUnavailable(e)),
        }
    }

    /// Append to the tracked stream only if the ref is not there yet. Used on
    /// the retry path, where the first attempt may have crashed on either
    /// side of the tracked write.
    fn complete_tracked(&self, event_key: &str) -> Result<(), EventStoreError> {
        let refs = match self.store.array_read(TRACKED_KEY, REFS_FIELD) {
            Ok(refs) => refs,
            Err(DocumentError::NotFound { .. }) => Vec::new(),
            Err(e) => return Err(EventStoreError::StoreUnavailable(e)),
        };
        if refs.iter().any(|v| v.as_str() == Some(event_key)) {
            return Ok(());
        }
        self.tracked_append(event_key)
    }

    fn fetch_envelope(&self, event_key: &str) -> Result<EventEnvelope, EventStoreError> {
        let document = self
            .store
            .get(event_key)
            .map_err(EventStoreError::StoreUnavailable)?
            .ok_or_else(|| {
                EventStoreError::corrupt(event_key, "referenced event document is missing")
            })?;
        EventEnvelope::from_document(&document)
    }
}

fn read_refs(document: &Document, key: &str) -> Result<Vec<Value>, EventStoreError> {
    match document.get(REFS_FIELD) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(_) => Err(EventStoreError::corrupt(key, "refs field is not an array")),
    }
}

impl StorageStrategy for IndexPerAggregate {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            snapshots: true,
            tracked_stream: true,
        }
    }

    fn append_events(&self, envelopes: &[EventEnvelope]) -> Result<(), EventStoreError> {
        for envelope in envelopes {
            self.append_one(envelope)?;
        }
        Ok(())
    }

    fn read_events(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        from_sequence: u64,
        batch_size: usize,
    ) -> Result<Vec<EventEnvelope>, EventStoreError> {
        let index_key = index_key(aggregate_type, aggregate_id);
        let index_doc = match self
            .store
            .get(&index_key)
            .map_err(EventStoreError::StoreUnavailable)?
        {
            Some(doc) => doc,
            // No index document means a logically unknown aggregate, even if
            // orphaned event documents exist.
            None => return Ok(Vec::new()),
        };

        let refs = read_refs(&index_doc, &index_key)?;
        let start = usize::try_from(from_sequence).unwrap_or(usize::MAX);

        let mut envelopes = Vec::new();
        for value in refs.iter().skip(start).take(batch_size) {
            let event_key = value
                .as_str()
                .ok_or_else(|| EventStoreError::corrupt(&index_key, "non-string event ref"))?;
            envelopes.push(self.fetch_envelope(event_key)?);
        }
        Ok(envelopes)
    }

    fn append_snapshot(&self, snapshot: &EventEnvelope) -> Result<(), EventStoreError> {
        let key = snapshot_key(&snapshot.aggregate_type, &snapshot.aggregate_id);
        let document = snapshot.to_document()?;
        self.store
            .upsert(&key, document)
            .map_err(EventStoreError::StoreUnavailable)?;
        tracing::debug!(
            aggregate_id = %snapshot.aggregate_id,
            sequence = snapshot.sequence_number,
            "snapshot stored"
        );
        Ok(())
    }

    fn read_last_snapshot(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> Result<Option<EventEnvelope>, EventStoreError> {
        let key = snapshot_key(aggregate_type, aggregate_id);
        match self
            .store
            .get(&key)
            .map_err(EventStoreError::StoreUnavailable)?
        {
            Some(document) => Ok(Some(EventEnvelope::from_document(&document)?)),
            None => Ok(None),
        }
    }

    fn read_tracked(
        &self,
        token: TrackingToken,
        batch_size: usize,
    ) -> Result<TrackedBatch, EventStoreError> {
        let refs = match self.store.array_read(TRACKED_KEY, REFS_FIELD) {
            Ok(refs) => refs,
            Err(DocumentError::NotFound { .. }) => Vec::new(),
            Err(e) => return Err(EventStoreError::StoreUnavailable(e)),
        };

        let start = usize::try_from(token.next_offset()).unwrap_or(usize::MAX);
        let mut envelopes = Vec::new();
        let mut token = token;
        for (offset, value) in refs.iter().enumerate().skip(start).take(batch_size) {
            let event_key = value
                .as_str()
                .ok_or_else(|| EventStoreError::corrupt(TRACKED_KEY, "non-string event ref"))?;
            envelopes.push(self.fetch_envelope(event_key)?);
            token = TrackingToken::at(offset as u64);
        }
        Ok(TrackedBatch { envelopes, token })
    }
}

#[cfg(test)]
#[path = "indexed_tests.rs"]
mod tests;
