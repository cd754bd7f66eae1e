// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! annal-storage: Document-store backends for the annal event store
//!
//! Two implementations of the `DocumentStore` contract from annal-core:
//! - `MemoryStore`: in-process map, for tests and ephemeral use
//! - `FileStore`: one JSON file per document under a base directory

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;
