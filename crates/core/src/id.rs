// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event identifier generation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generates globally unique event identifiers
pub trait EventIdGen: Clone + Send + Sync {
    fn next_id(&self) -> String;
}

/// UUID-based identifier generator for production use
#[derive(Clone, Default)]
pub struct UuidEventIds;

impl EventIdGen for UuidEventIds {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Sequential identifier generator for deterministic tests
#[derive(Clone)]
pub struct SequentialEventIds {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialEventIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialEventIds {
    fn default() -> Self {
        Self::new("ev")
    }
}

impl EventIdGen for SequentialEventIds {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, n)
    }
}
