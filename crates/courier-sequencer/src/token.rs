// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opaque application token generation.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::RngCore;
use tracing::debug;

use courier_core::{CounterStore, CourierError};

/// Tracking set holding recently issued tokens for collision checks.
const TRACKING_SET: &str = "application:tokens";

/// Global counter key contributing the uniqueness component.
const COUNTER_KEY: &str = "application:token:counter";

/// Above this size the tracking set gets trimmed...
const TRACKING_SET_MAX: i64 = 10_000;

/// ...down to this size, by evicting a random subset.
const TRACKING_SET_KEEP: i64 = 5_000;

/// Issues globally unique opaque application tokens.
///
/// A token concatenates three components in shuffled order: the unix
/// timestamp, a globally incrementing counter, and 8 random bytes hex
/// encoded. The shuffle only obscures the layout; collision resistance
/// comes from the counter and the randomness. The tracking set is a
/// bounded safety net: once trimmed, an evicted token could in principle
/// collide again, which the counter component makes practically
/// impossible.
#[derive(Clone)]
pub struct TokenGenerator {
    counters: Arc<dyn CounterStore>,
}

impl TokenGenerator {
    pub fn new(counters: Arc<dyn CounterStore>) -> Self {
        Self { counters }
    }

    /// Generate a fresh token, guaranteed absent from the tracking set.
    pub async fn generate(&self) -> Result<String, CourierError> {
        loop {
            let token = self.random_token().await?;
            if self.counters.set_contains(TRACKING_SET, &token).await? {
                // Astronomically unlikely given the counter component;
                // loop rather than fail.
                debug!("token collision in tracking set, regenerating");
                continue;
            }
            self.counters.set_add(TRACKING_SET, &token).await?;
            self.trim_tracking_set().await?;
            return Ok(token);
        }
    }

    async fn random_token(&self) -> Result<String, CourierError> {
        let timestamp = chrono::Utc::now().timestamp();
        let unique_id = self.counters.incr(COUNTER_KEY).await?;

        let mut bytes = [0u8; 8];
        rand::rngs::OsRng.fill_bytes(&mut bytes);

        let mut components = [
            timestamp.to_string(),
            unique_id.to_string(),
            hex::encode(bytes),
        ];
        components.shuffle(&mut rand::thread_rng());

        Ok(components.concat())
    }

    async fn trim_tracking_set(&self) -> Result<(), CourierError> {
        let len = self.counters.set_len(TRACKING_SET).await?;
        if len > TRACKING_SET_MAX {
            let evicted = self
                .counters
                .set_evict_random(TRACKING_SET, len - TRACKING_SET_KEEP)
                .await?;
            debug!(evicted, "trimmed token tracking set");
        }
        Ok(())
    }
}
