// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Document-store contract that storage backends implement

use serde_json::Value;
use thiserror::Error;

/// A stored document: a JSON object living at a string key.
pub type Document = serde_json::Map<String, Value>;

/// Errors surfaced by a document store
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("key already exists: {key}")]
    AlreadyExists { key: String },
    #[error("key not found: {key}")]
    NotFound { key: String },
    #[error("field {field} of {key} is not an array")]
    NotAnArray { key: String, field: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("backend error: {message}")]
    Backend { message: String },
}

/// The minimal key/value contract a backing document database must provide.
///
/// Keys are plain strings; documents are nested maps of strings, numbers,
/// arrays and sub-maps. No query capability beyond these primitives is
/// assumed. `field` arguments name a top-level array field of the document;
/// the built-in layouts never need deeper paths.
pub trait DocumentStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Document>, DocumentError>;

    fn exists(&self, key: &str) -> Result<bool, DocumentError>;

    /// Conditional insert. Fails with [`DocumentError::AlreadyExists`] when
    /// the key is already taken; this is the primitive the duplicate-append
    /// guard is built on.
    fn insert(&self, key: &str, document: Document) -> Result<(), DocumentError>;

    /// Unconditional write, overwriting any existing document.
    fn upsert(&self, key: &str, document: Document) -> Result<(), DocumentError>;

    /// Atomically append `value` to the array at `field`. Fails with
    /// [`DocumentError::NotFound`] when the key is absent; creates the field
    /// when the document exists but the field does not.
    fn array_append(&self, key: &str, field: &str, value: Value) -> Result<(), DocumentError>;

    /// Read the ordered array at `field`. Fails with
    /// [`DocumentError::NotFound`] when the key is absent; yields an empty
    /// array when the field is missing.
    fn array_read(&self, key: &str, field: &str) -> Result<Vec<Value>, DocumentError>;
}
