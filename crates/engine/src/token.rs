// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Position markers into the global event order

use serde::{Deserialize, Serialize};

/// Opaque cursor into the global, cross-aggregate event order.
///
/// A stateless value object owned by the consumer: the engine returns an
/// advanced token with every tracked batch, and the consumer hands it back
/// to resume. Tokens are totally ordered; the default token means "start of
/// history", before the first event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct TrackingToken(Option<u64>);

impl TrackingToken {
    /// The position before the first event in history.
    pub fn start() -> Self {
        Self(None)
    }

    /// The position of the event at the given global offset.
    pub fn at(offset: u64) -> Self {
        Self(Some(offset))
    }

    /// The global offset of the last consumed event, if any.
    pub fn offset(&self) -> Option<u64> {
        self.0
    }

    /// The offset of the next event to consume.
    pub(crate) fn next_offset(&self) -> u64 {
        self.0.map_or(0, |offset| offset + 1)
    }
}
