//! annal-core: Core library for the annal event store
//!
//! This crate provides:
//! - The domain event model and its persisted envelope form
//! - The serializer and upcaster seams the replay path is built on
//! - The document-store contract that storage backends implement
//! - The error taxonomy shared by every store operation

pub mod envelope;
pub mod error;
pub mod event;
pub mod id;
pub mod serializer;
pub mod store;
pub mod upcaster;

// Re-exports
pub use envelope::EventEnvelope;
pub use error::EventStoreError;
pub use event::{DomainEvent, EventPayload, Metadata};
pub use id::{EventIdGen, SequentialEventIds, UuidEventIds};
pub use serializer::{EventSerializer, JsonSerializer, Representation, SerializedObject, TextSerializer};
pub use store::{Document, DocumentError, DocumentStore};
pub use upcaster::{IdentityChain, UpcasterChain};
