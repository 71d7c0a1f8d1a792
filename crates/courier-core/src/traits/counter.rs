// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Counter store trait: atomic counters and membership sets.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::traits::adapter::BackendAdapter;

/// Adapter for the atomic key/value store backing sequence allocation and
/// token uniqueness tracking.
///
/// The store is shared process-wide state that must hold across any number
/// of concurrent server instances, so implementations round-trip every
/// operation to the backing store; nothing is cached in process memory.
#[async_trait]
pub trait CounterStore: BackendAdapter {
    /// Atomically increment `key` and return the new value. Missing keys
    /// start at 0, so the first increment returns 1.
    async fn incr(&self, key: &str) -> Result<i64, CourierError>;

    /// Current value of `key` (0 if absent).
    async fn get(&self, key: &str) -> Result<i64, CourierError>;

    /// Compare-and-swap decrement: subtract 1 from `key` only if it still
    /// holds `expected`. Returns whether the decrement was applied.
    ///
    /// This is the compensating-decrement guard: only the most recently
    /// allocated value can be taken back, so a racing allocation can never
    /// be pushed below a still-outstanding number.
    async fn decr_if_eq(&self, key: &str, expected: i64) -> Result<bool, CourierError>;

    // --- Membership set operations (token uniqueness tracking) ---

    /// Add `member` to `set`. Returns false if it was already present.
    async fn set_add(&self, set: &str, member: &str) -> Result<bool, CourierError>;

    /// Whether `member` is present in `set`.
    async fn set_contains(&self, set: &str, member: &str) -> Result<bool, CourierError>;

    /// Number of members in `set`.
    async fn set_len(&self, set: &str) -> Result<i64, CourierError>;

    /// Evict up to `count` randomly chosen members from `set`. Returns how
    /// many were removed.
    async fn set_evict_random(&self, set: &str, count: i64) -> Result<i64, CourierError>;
}
