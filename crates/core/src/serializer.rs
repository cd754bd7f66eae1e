// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serializer seam between domain payloads and their persisted form

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The persisted shape of a serialized value.
///
/// Untagged on purpose: a stored string reads back as [`Representation::Text`]
/// and anything else as [`Representation::Structured`], so the record itself
/// tells a reader how to parse it. No external schema is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Representation {
    Text(String),
    Structured(Value),
}

impl Representation {
    pub fn is_structured(&self) -> bool {
        matches!(self, Representation::Structured(_))
    }
}

/// A serialized payload together with the type information needed to decode
/// it later: the (data, typeName, typeRevision) triple the upcaster chain
/// transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedObject {
    pub data: Representation,
    pub type_name: String,
    pub revision: Option<String>,
}

impl SerializedObject {
    pub fn new(data: Representation, type_name: impl Into<String>) -> Self {
        Self {
            data,
            type_name: type_name.into(),
            revision: None,
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }
}

/// Converts opaque payload values to and from their persisted representation.
///
/// The serialization target is chosen once, at write time: a serializer that
/// supports a structured target stores values as-is, everything else falls
/// back to text. Reads are driven by the stored representation, not by the
/// serializer's preference, so either serializer can decode records written
/// by the other.
pub trait EventSerializer: Send + Sync {
    /// Whether this serializer can emit a structured (non-text) target.
    fn supports_structured(&self) -> bool;

    fn serialize(&self, value: &Value) -> Result<Representation, serde_json::Error>;

    fn deserialize(&self, data: &Representation) -> Result<Value, serde_json::Error>;
}

/// Serializer with a structured target: values are stored as JSON trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl EventSerializer for JsonSerializer {
    fn supports_structured(&self) -> bool {
        true
    }

    fn serialize(&self, value: &Value) -> Result<Representation, serde_json::Error> {
        Ok(Representation::Structured(value.clone()))
    }

    fn deserialize(&self, data: &Representation) -> Result<Value, serde_json::Error> {
        match data {
            Representation::Structured(value) => Ok(value.clone()),
            Representation::Text(text) => serde_json::from_str(text),
        }
    }
}

/// Serializer without a structured target: values are stored as JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextSerializer;

impl EventSerializer for TextSerializer {
    fn supports_structured(&self) -> bool {
        false
    }

    fn serialize(&self, value: &Value) -> Result<Representation, serde_json::Error> {
        Ok(Representation::Text(serde_json::to_string(value)?))
    }

    fn deserialize(&self, data: &Representation) -> Result<Value, serde_json::Error> {
        match data {
            Representation::Structured(value) => Ok(value.clone()),
            Representation::Text(text) => serde_json::from_str(text),
        }
    }
}

#[cfg(test)]
#[path = "serializer_tests.rs"]
mod tests;
