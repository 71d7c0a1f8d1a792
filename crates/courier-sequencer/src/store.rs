// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the CounterStore trait.
//!
//! Lives in its own database file so counters stay available and atomic
//! independently of the entity store. Every operation is a single
//! statement executed on the connection's background thread, which makes
//! it atomic across all concurrent callers in the process, and the
//! underlying store transaction makes it atomic across processes.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use tokio_rusqlite::Connection;
use tracing::debug;

use courier_core::types::{AdapterType, HealthStatus};
use courier_core::{BackendAdapter, CounterStore, CourierError};

/// Convert tokio_rusqlite errors into `CourierError::Counter`.
fn counter_err(e: tokio_rusqlite::Error) -> CourierError {
    CourierError::Counter {
        source: Box::new(e),
    }
}

/// SQLite-backed counter store.
pub struct SqliteCounters {
    conn: Connection,
}

impl SqliteCounters {
    /// Open (or create) the counter database at `path`.
    pub async fn open(path: &str) -> Result<Self, CourierError> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| counter_err(e.into()))?;
        Self::prepare(conn).await
    }

    /// Open an in-memory counter store. Test use only; an in-memory store
    /// cannot be shared across server instances.
    pub async fn open_in_memory() -> Result<Self, CourierError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| counter_err(e.into()))?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self, CourierError> {
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;

                 CREATE TABLE IF NOT EXISTS counters (
                     key TEXT PRIMARY KEY NOT NULL,
                     value INTEGER NOT NULL DEFAULT 0
                 );

                 CREATE TABLE IF NOT EXISTS tracked_tokens (
                     set_name TEXT NOT NULL,
                     member TEXT NOT NULL,
                     PRIMARY KEY (set_name, member)
                 );",
            )?;
            Ok(())
        })
        .await
        .map_err(counter_err)?;
        debug!("counter store opened");
        Ok(Self { conn })
    }
}

#[async_trait]
impl BackendAdapter for SqliteCounters {
    fn name(&self) -> &str {
        "sqlite-counters"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Counter
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(counter_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(counter_err)
    }
}

#[async_trait]
impl CounterStore for SqliteCounters {
    async fn incr(&self, key: &str) -> Result<i64, CourierError> {
        let key = key.to_string();
        self.conn
            .call(move |conn| {
                let value = conn.query_row(
                    "INSERT INTO counters (key, value) VALUES (?1, 1)
                     ON CONFLICT(key) DO UPDATE SET value = value + 1
                     RETURNING value",
                    params![key],
                    |row| row.get(0),
                )?;
                Ok(value)
            })
            .await
            .map_err(counter_err)
    }

    async fn get(&self, key: &str) -> Result<i64, CourierError> {
        let key = key.to_string();
        self.conn
            .call(move |conn| {
                let value = conn
                    .query_row(
                        "SELECT value FROM counters WHERE key = ?1",
                        params![key],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(value.unwrap_or(0))
            })
            .await
            .map_err(counter_err)
    }

    async fn decr_if_eq(&self, key: &str, expected: i64) -> Result<bool, CourierError> {
        let key = key.to_string();
        self.conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE counters SET value = value - 1 WHERE key = ?1 AND value = ?2",
                    params![key, expected],
                )?;
                Ok(changed == 1)
            })
            .await
            .map_err(counter_err)
    }

    async fn set_add(&self, set: &str, member: &str) -> Result<bool, CourierError> {
        let set = set.to_string();
        let member = member.to_string();
        self.conn
            .call(move |conn| {
                let inserted = conn.execute(
                    "INSERT OR IGNORE INTO tracked_tokens (set_name, member) VALUES (?1, ?2)",
                    params![set, member],
                )?;
                Ok(inserted == 1)
            })
            .await
            .map_err(counter_err)
    }

    async fn set_contains(&self, set: &str, member: &str) -> Result<bool, CourierError> {
        let set = set.to_string();
        let member = member.to_string();
        self.conn
            .call(move |conn| {
                let present = conn
                    .query_row(
                        "SELECT 1 FROM tracked_tokens WHERE set_name = ?1 AND member = ?2",
                        params![set, member],
                        |_| Ok(()),
                    )
                    .optional()?
                    .is_some();
                Ok(present)
            })
            .await
            .map_err(counter_err)
    }

    async fn set_len(&self, set: &str) -> Result<i64, CourierError> {
        let set = set.to_string();
        self.conn
            .call(move |conn| {
                let len = conn.query_row(
                    "SELECT COUNT(*) FROM tracked_tokens WHERE set_name = ?1",
                    params![set],
                    |row| row.get(0),
                )?;
                Ok(len)
            })
            .await
            .map_err(counter_err)
    }

    async fn set_evict_random(&self, set: &str, count: i64) -> Result<i64, CourierError> {
        let set = set.to_string();
        self.conn
            .call(move |conn| {
                let removed = conn.execute(
                    "DELETE FROM tracked_tokens
                     WHERE set_name = ?1 AND member IN (
                         SELECT member FROM tracked_tokens
                         WHERE set_name = ?1
                         ORDER BY RANDOM()
                         LIMIT ?2
                     )",
                    params![set, count],
                )?;
                Ok(removed as i64)
            })
            .await
            .map_err(counter_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn incr_starts_at_one_and_counts_up() {
        let store = SqliteCounters::open_in_memory().await.unwrap();

        assert_eq!(store.incr("a").await.unwrap(), 1);
        assert_eq!(store.incr("a").await.unwrap(), 2);
        assert_eq!(store.incr("a").await.unwrap(), 3);
        // Independent key, independent sequence.
        assert_eq!(store.incr("b").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn get_missing_key_is_zero() {
        let store = SqliteCounters::open_in_memory().await.unwrap();
        assert_eq!(store.get("missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn decr_if_eq_only_applies_on_match() {
        let store = SqliteCounters::open_in_memory().await.unwrap();

        store.incr("a").await.unwrap();
        store.incr("a").await.unwrap();

        // Stale expectation: counter moved past 1, so nothing happens.
        assert!(!store.decr_if_eq("a", 1).await.unwrap());
        assert_eq!(store.get("a").await.unwrap(), 2);

        // Matching expectation: rolls the latest allocation back.
        assert!(store.decr_if_eq("a", 2).await.unwrap());
        assert_eq!(store.get("a").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn set_add_is_idempotent() {
        let store = SqliteCounters::open_in_memory().await.unwrap();

        assert!(store.set_add("tokens", "t1").await.unwrap());
        assert!(!store.set_add("tokens", "t1").await.unwrap());
        assert!(store.set_contains("tokens", "t1").await.unwrap());
        assert!(!store.set_contains("tokens", "t2").await.unwrap());
        assert_eq!(store.set_len("tokens").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn set_evict_random_removes_requested_count() {
        let store = SqliteCounters::open_in_memory().await.unwrap();

        for i in 0..10 {
            store.set_add("tokens", &format!("t{i}")).await.unwrap();
        }
        let removed = store.set_evict_random("tokens", 4).await.unwrap();
        assert_eq!(removed, 4);
        assert_eq!(store.set_len("tokens").await.unwrap(), 6);
    }

    #[tokio::test]
    async fn counters_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.db");

        let store = SqliteCounters::open(path.to_str().unwrap()).await.unwrap();
        store.incr("a").await.unwrap();
        store.incr("a").await.unwrap();
        store.shutdown().await.unwrap();

        let store = SqliteCounters::open(path.to_str().unwrap()).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), 2);
        assert_eq!(store.incr("a").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn concurrent_incr_yields_distinct_contiguous_values() {
        use std::sync::Arc;

        let store = Arc::new(SqliteCounters::open_in_memory().await.unwrap());

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.incr("seq").await }));
        }

        let mut values = Vec::new();
        for handle in handles {
            values.push(handle.await.unwrap().unwrap());
        }
        values.sort_unstable();
        assert_eq!(values, (1..=20).collect::<Vec<i64>>());
    }
}
