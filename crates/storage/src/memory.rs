// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process document store

use annal_core::{Document, DocumentError, DocumentStore};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Document store backed by an in-process map.
///
/// The mutex around the map is what makes `insert` and `array_append`
/// atomic with respect to concurrent callers.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<String, Document>> {
        match self.documents.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Document>, DocumentError> {
        Ok(self.guard().get(key).cloned())
    }

    fn exists(&self, key: &str) -> Result<bool, DocumentError> {
        Ok(self.guard().contains_key(key))
    }

    fn insert(&self, key: &str, document: Document) -> Result<(), DocumentError> {
        let mut documents = self.guard();
        if documents.contains_key(key) {
            return Err(DocumentError::AlreadyExists {
                key: key.to_string(),
            });
        }
        documents.insert(key.to_string(), document);
        Ok(())
    }

    fn upsert(&self, key: &str, document: Document) -> Result<(), DocumentError> {
        self.guard().insert(key.to_string(), document);
        Ok(())
    }

    fn array_append(&self, key: &str, field: &str, value: Value) -> Result<(), DocumentError> {
        let mut documents = self.guard();
        let document = documents
            .get_mut(key)
            .ok_or_else(|| DocumentError::NotFound {
                key: key.to_string(),
            })?;
        match document
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(items) => {
                items.push(value);
                Ok(())
            }
            _ => Err(DocumentError::NotAnArray {
                key: key.to_string(),
                field: field.to_string(),
            }),
        }
    }

    fn array_read(&self, key: &str, field: &str) -> Result<Vec<Value>, DocumentError> {
        let documents = self.guard();
        let document = documents.get(key).ok_or_else(|| DocumentError::NotFound {
            key: key.to_string(),
        })?;
        match document.get(field) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(_) => Err(DocumentError::NotAnArray {
                key: key.to_string(),
                field: field.to_string(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
