// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON file-based document store

use annal_core::{Document, DocumentError, DocumentStore};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// Document store keeping one `<key>.json` file per document under a base
/// directory.
///
/// `insert` maps to an exclusive file creation, so the conditional-insert
/// semantic holds across processes. The read-modify-write inside
/// `array_append` is serialized by an internal lock; that makes the
/// mutation atomic within a single process, which is the scope this store
/// is meant for.
pub struct FileStore {
    base_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open a store at the given directory, creating it if needed.
    pub fn open(base_path: impl Into<PathBuf>) -> Result<Self, DocumentError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;
        Ok(Self {
            base_path,
            write_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, DocumentError> {
        // Keys are flat names; anything that could escape the base directory
        // is refused.
        if key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(DocumentError::Backend {
                message: format!("invalid key: {}", key),
            });
        }
        Ok(self.base_path.join(format!("{}.json", key)))
    }

    fn read_document(&self, key: &str) -> Result<Option<Document>, DocumentError> {
        let path = self.path_for(key)?;
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn write_document(&self, key: &str, document: &Document) -> Result<(), DocumentError> {
        let path = self.path_for(key)?;
        let json = serde_json::to_string_pretty(document)?;
        fs::write(&path, json)?;
        Ok(())
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl DocumentStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Document>, DocumentError> {
        self.read_document(key)
    }

    fn exists(&self, key: &str) -> Result<bool, DocumentError> {
        Ok(self.path_for(key)?.exists())
    }

    fn insert(&self, key: &str, document: Document) -> Result<(), DocumentError> {
        let path = self.path_for(key)?;
        let json = serde_json::to_string_pretty(&document)?;
        // create_new refuses to open an existing file, which is exactly the
        // conditional-insert contract.
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(DocumentError::AlreadyExists {
                    key: key.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    fn upsert(&self, key: &str, document: Document) -> Result<(), DocumentError> {
        let _guard = self.guard();
        self.write_document(key, &document)
    }

    fn array_append(&self, key: &str, field: &str, value: Value) -> Result<(), DocumentError> {
        let _guard = self.guard();
        let mut document = self
            .read_document(key)?
            .ok_or_else(|| DocumentError::NotFound {
                key: key.to_string(),
            })?;
        match document
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(items) => items.push(value),
            _ => {
                return Err(DocumentError::NotAnArray {
                    key: key.to_string(),
                    field: field.to_string(),
                })
            }
        }
        self.write_document(key, &document)
    }

    fn array_read(&self, key: &str, field: &str) -> Result<Vec<Value>, DocumentError> {
        let document = self
            .read_document(key)?
            .ok_or_else(|| DocumentError::NotFound {
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
#[path = "file_tests.rs"]
mod tests;
