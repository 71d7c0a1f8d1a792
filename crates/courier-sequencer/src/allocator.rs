// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sequence allocation for chat and message numbers.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use courier_core::{CounterStore, CourierError};

/// The entity family a sequence number is allocated in.
///
/// Scope keys derive from the parent's internal durable id, never from
/// user-supplied tokens: external tokens can in principle be reissued,
/// and a reissued token must not resume a previous tenant's sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Chat numbers within one application.
    Chats { application_id: i64 },
    /// Message numbers within one chat.
    Messages { chat_id: i64 },
}

impl Scope {
    /// The counter-store key for this scope.
    pub fn key(&self) -> String {
        match self {
            Self::Chats { application_id } => format!("chats:application:{application_id}"),
            Self::Messages { chat_id } => format!("messages:chat:{chat_id}"),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Hands out per-scope sequence numbers, starting at 1, strictly
/// increasing, with no two callers ever observing the same value.
///
/// Every allocation round-trips to the shared counter store; nothing is
/// cached in process memory, so uniqueness holds across any number of
/// server instances.
#[derive(Clone)]
pub struct SequenceAllocator {
    counters: Arc<dyn CounterStore>,
}

impl SequenceAllocator {
    pub fn new(counters: Arc<dyn CounterStore>) -> Self {
        Self { counters }
    }

    /// Allocate the next number in `scope`.
    ///
    /// Counter store unavailable means allocation fails fast with a
    /// retryable error; a number is never fabricated locally.
    pub async fn allocate(&self, scope: Scope) -> Result<i64, CourierError> {
        self.counters.incr(&scope.key()).await
    }

    /// Compensating decrement after an allocation whose downstream write
    /// failed.
    ///
    /// Guarded by `number`: the decrement applies only while the counter
    /// still holds the value being released, so only the most recent
    /// allocation can be taken back and the counter can never drop below
    /// a still-outstanding number. Returns whether the number was
    /// reclaimed; a lost race leaves a permanent gap in the scope, which
    /// is accepted and logged.
    pub async fn release(&self, scope: Scope, number: i64) -> Result<bool, CourierError> {
        let released = self.counters.decr_if_eq(&scope.key(), number).await?;
        if !released {
            warn!(
                scope = %scope,
                number,
                "sequence number could not be released; scope keeps a permanent gap"
            );
        }
        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteCounters;

    async fn make_allocator() -> SequenceAllocator {
        let counters = Arc::new(SqliteCounters::open_in_memory().await.unwrap());
        SequenceAllocator::new(counters)
    }

    #[tokio::test]
    async fn allocation_starts_at_one_per_scope() {
        let allocator = make_allocator().await;

        let chats = Scope::Chats { application_id: 7 };
        let messages = Scope::Messages { chat_id: 7 };

        assert_eq!(allocator.allocate(chats).await.unwrap(), 1);
        assert_eq!(allocator.allocate(chats).await.unwrap(), 2);
        // Same numeric parent id, different family, independent sequence.
        assert_eq!(allocator.allocate(messages).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_allocations_are_distinct_and_contiguous() {
        let allocator = make_allocator().await;
        let scope = Scope::Messages { chat_id: 1 };

        let mut handles = Vec::new();
        for _ in 0..20 {
            let allocator = allocator.clone();
            handles.push(tokio::spawn(async move { allocator.allocate(scope).await }));
        }

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap().unwrap());
        }
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=20).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn release_reclaims_only_the_latest_number() {
        let allocator = make_allocator().await;
        let scope = Scope::Chats { application_id: 1 };

        allocator.allocate(scope).await.unwrap();
        let latest = allocator.allocate(scope).await.unwrap();
        assert_eq!(latest, 2);

        // Releasing an older allocation must be refused.
        assert!(!allocator.release(scope, 1).await.unwrap());
        // Releasing the latest succeeds and the number is reused.
        assert!(allocator.release(scope, latest).await.unwrap());
        assert_eq!(allocator.allocate(scope).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn lost_release_race_leaves_a_gap() {
        let allocator = make_allocator().await;
        let scope = Scope::Chats { application_id: 1 };

        let stale = allocator.allocate(scope).await.unwrap();
        // Another request allocates before the release lands.
        allocator.allocate(scope).await.unwrap();

        assert!(!allocator.release(scope, stale).await.unwrap());
        // The sequence moves on; number 1 is a permanent gap.
        assert_eq!(allocator.allocate(scope).await.unwrap(), 3);
    }
}
