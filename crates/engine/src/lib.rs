// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! annal-engine: Event-store engine and storage strategies
//!
//! This crate provides:
//! - The `StorageStrategy` contract and its two layouts: an index plus one
//!   document per event, and a single growing document per aggregate
//! - The strategy-agnostic `EventStoreEngine` that batches appends, replays
//!   aggregates, and serves the global tracked stream
//! - The lazy, flattening `EventStream` replay iterator

pub mod engine;
pub mod strategy;
pub mod stream;
pub mod token;

// Re-exports
pub use engine::{EngineConfig, EventStoreEngine, TrackedEvents};
pub use strategy::indexed::IndexPerAggregate;
pub use strategy::single::{SingleDocumentConfig, SingleDocumentPerAggregate};
pub use strategy::{
    Capabilities, ConflictClassifier, KeyExistsClassifier, StorageStrategy, TrackedBatch,
};
pub use stream::EventStream;
pub use token::TrackingToken;
