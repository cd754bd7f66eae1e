// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upcaster seam for schema evolution at read time

use crate::serializer::SerializedObject;

/// Transforms stored payloads from older schema revisions into the current
/// format during replay.
///
/// One stored record may upcast to zero, one, or several current-format
/// payloads; that expansion is preserved all the way to the caller. A chain
/// that does not recognize a payload type cannot decode records of it, and
/// the replay path decides whether that skips the record or fails.
pub trait UpcasterChain: Send + Sync {
    /// Whether this chain can bring payloads of the given type and revision
    /// to the current format.
    fn recognizes(&self, type_name: &str, revision: Option<&str>) -> bool;

    /// Transform one stored payload into zero or more current-format
    /// payloads. Only called for recognized types.
    fn upcast(&self, object: SerializedObject) -> Vec<SerializedObject>;
}

/// Chain that recognizes everything and upcasts nothing.
///
/// The right default when all stored records are already in the current
/// format.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityChain;

impl UpcasterChain for IdentityChain {
    fn recognizes(&self, _type_name: &str, _revision: Option<&str>) -> bool {
        true
    }

    fn upcast(&self, object: SerializedObject) -> Vec<SerializedObject> {
        vec![object]
    }
}
