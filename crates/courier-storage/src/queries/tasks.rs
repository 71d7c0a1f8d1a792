// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task queue operations for crash-safe asynchronous writes.
//!
//! Delivery is at-least-once: `dequeue` claims an entry under a
//! processing lock, and [`reap_expired`] returns entries whose lock
//! expired (worker crash, runaway handler) to pending for redelivery.

use std::time::Duration;

use courier_core::CourierError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::TaskEntry;

/// How long a claimed entry stays locked before it is considered abandoned.
const PROCESSING_LOCK_SECS: u64 = 300;

const COLUMNS: &str = "id, queue_name, payload, status, attempts, max_attempts,
                       created_at, updated_at, run_after, locked_until";

/// Enqueue a new task. Returns the auto-generated queue entry ID.
pub async fn enqueue(
    db: &Database,
    queue_name: &str,
    payload: &str,
    max_attempts: i64,
) -> Result<i64, CourierError> {
    let queue_name = queue_name.to_string();
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO tasks (queue_name, payload, max_attempts) VALUES (?1, ?2, ?3)",
                params![queue_name, payload, max_attempts],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Dequeue the next runnable pending entry from the named queue.
///
/// Atomically selects the oldest pending entry whose `run_after` has
/// passed and marks it "processing" under a lock deadline. Returns `None`
/// if nothing is runnable.
pub async fn dequeue(db: &Database, queue_name: &str) -> Result<Option<TaskEntry>, CourierError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| {
            // Transaction to atomically find + claim the next entry.
            let tx = conn.transaction()?;

            let result = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {COLUMNS} FROM tasks
                     WHERE queue_name = ?1 AND status = 'pending'
                       AND (run_after IS NULL OR run_after <= strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                     ORDER BY id ASC
                     LIMIT 1"
                ))?;
                stmt.query_row(params![queue_name], row_to_entry)
            };

            match result {
                Ok(entry) => {
                    tx.execute(
                        "UPDATE tasks SET status = 'processing',
                         locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?2),
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE id = ?1",
                        params![entry.id, format!("+{PROCESSING_LOCK_SECS} seconds")],
                    )?;
                    tx.commit()?;

                    Ok(Some(TaskEntry {
                        status: "processing".to_string(),
                        ..entry
                    }))
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    tx.commit()?;
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Acknowledge successful processing: marks the entry "completed".
pub async fn ack(db: &Database, id: i64) -> Result<(), CourierError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE tasks SET status = 'completed', locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Record a failed attempt.
///
/// Increments attempts. At the attempt budget the entry moves to the
/// terminal "failed" state (the dead-letter state); otherwise it returns
/// to "pending" with `run_after` pushed out by `backoff`.
pub async fn fail(db: &Database, id: i64, backoff: Duration) -> Result<(), CourierError> {
    let backoff_modifier = format!("+{} seconds", backoff.as_secs_f64());
    db.connection()
        .call(move |conn| {
            let (attempts, max_attempts): (i64, i64) = conn.query_row(
                "SELECT attempts, max_attempts FROM tasks WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let new_attempts = attempts + 1;
            if new_attempts >= max_attempts {
                conn.execute(
                    "UPDATE tasks SET status = 'failed', attempts = ?1,
                     locked_until = NULL, run_after = NULL,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?2",
                    params![new_attempts, id],
                )?;
            } else {
                conn.execute(
                    "UPDATE tasks SET status = 'pending', attempts = ?1,
                     locked_until = NULL,
                     run_after = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?2),
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?3",
                    params![new_attempts, backoff_modifier, id],
                )?;
            }
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Move an entry straight to the terminal "failed" state.
///
/// For deterministic failures (unparseable payload, vanished parent)
/// where burning the retry budget would only delay the dead-letter
/// report.
pub async fn discard(db: &Database, id: i64) -> Result<(), CourierError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE tasks SET status = 'failed', locked_until = NULL, run_after = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Return entries whose processing lock expired to pending.
///
/// Covers workers that died mid-task; the redelivered entry keeps its
/// attempt count.
pub async fn reap_expired(db: &Database, queue_name: &str) -> Result<u64, CourierError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| {
            let reaped = conn.execute(
                "UPDATE tasks SET status = 'pending', locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE queue_name = ?1 AND status = 'processing'
                   AND locked_until < strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![queue_name],
            )?;
            Ok(reaped as u64)
        })
        .await
        .map_err(map_tr_err)
}

/// List entries in the terminal "failed" state.
pub async fn list_dead(db: &Database, queue_name: &str) -> Result<Vec<TaskEntry>, CourierError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM tasks
                 WHERE queue_name = ?1 AND status = 'failed'
                 ORDER BY id ASC"
            ))?;
            let entries = stmt
                .query_map(params![queue_name], row_to_entry)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(entries)
        })
        .await
        .map_err(map_tr_err)
}

fn row_to_entry(row: &rusqlite::Row) -> Result<TaskEntry, rusqlite::Error> {
    Ok(TaskEntry {
        id: row.get(0)?,
        queue: row.get(1)?,
        payload: row.get(2)?,
        status: row.get(3)?,
        attempts: row.get(4)?,
        max_attempts: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        run_after: row.get(8)?,
        locked_until: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn enqueue_and_dequeue_lifecycle() {
        let (db, _dir) = setup_db().await;

        let id = enqueue(&db, "writes", r#"{"kind":"x"}"#, 3).await.unwrap();
        assert!(id > 0);

        let entry = dequeue(&db, "writes").await.unwrap().unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.status, "processing");
        assert_eq!(entry.payload, r#"{"kind":"x"}"#);

        // Nothing else runnable while the entry is claimed.
        assert!(dequeue(&db, "writes").await.unwrap().is_none());

        ack(&db, id).await.unwrap();
        assert!(dequeue(&db, "writes").await.unwrap().is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn dequeue_is_fifo() {
        let (db, _dir) = setup_db().await;

        let first = enqueue(&db, "writes", "a", 3).await.unwrap();
        let second = enqueue(&db, "writes", "b", 3).await.unwrap();

        assert_eq!(dequeue(&db, "writes").await.unwrap().unwrap().id, first);
        assert_eq!(dequeue(&db, "writes").await.unwrap().unwrap().id, second);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn fail_applies_backoff_before_retry() {
        let (db, _dir) = setup_db().await;

        let id = enqueue(&db, "writes", "x", 3).await.unwrap();
        dequeue(&db, "writes").await.unwrap().unwrap();

        fail(&db, id, Duration::from_secs(60)).await.unwrap();

        // Pending again, but not runnable until the backoff elapses.
        let (status, attempts): (String, i64) = db
            .connection()
            .call(move |conn| {
                let row = conn.query_row(
                    "SELECT status, attempts FROM tasks WHERE id = ?1",
                    params![id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                Ok::<(String, i64), rusqlite::Error>(row)
            })
            .await
            .unwrap();
        assert_eq!(status, "pending");
        assert_eq!(attempts, 1);
        assert!(dequeue(&db, "writes").await.unwrap().is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn fail_with_zero_backoff_is_immediately_runnable() {
        let (db, _dir) = setup_db().await;

        let id = enqueue(&db, "writes", "x", 3).await.unwrap();
        dequeue(&db, "writes").await.unwrap().unwrap();
        fail(&db, id, Duration::ZERO).await.unwrap();

        let entry = dequeue(&db, "writes").await.unwrap().unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.attempts, 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn exhausted_attempts_move_to_dead_letter() {
        let (db, _dir) = setup_db().await;

        let id = enqueue(&db, "writes", "poison", 3).await.unwrap();

        for _ in 0..3 {
            dequeue(&db, "writes").await.unwrap().unwrap();
            fail(&db, id, Duration::ZERO).await.unwrap();
        }

        assert!(dequeue(&db, "writes").await.unwrap().is_none());

        let dead = list_dead(&db, "writes").await.unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].id, id);
        assert_eq!(dead[0].status, "failed");
        assert_eq!(dead[0].attempts, 3);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reap_returns_expired_locks_to_pending() {
        let (db, _dir) = setup_db().await;

        let id = enqueue(&db, "writes", "x", 3).await.unwrap();
        dequeue(&db, "writes").await.unwrap().unwrap();

        // Fresh lock: nothing to reap.
        assert_eq!(reap_expired(&db, "writes").await.unwrap(), 0);

        // Force the lock into the past.
        db.connection()
            .call(move |conn| {
                conn.execute(
                    "UPDATE tasks SET locked_until = '2000-01-01T00:00:00.000Z' WHERE id = ?1",
                    params![id],
                )?;
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();

        assert_eq!(reap_expired(&db, "writes").await.unwrap(), 1);
        let entry = dequeue(&db, "writes").await.unwrap().unwrap();
        assert_eq!(entry.id, id);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn queues_are_independent() {
        let (db, _dir) = setup_db().await;

        enqueue(&db, "writes", "a", 3).await.unwrap();
        assert!(dequeue(&db, "other").await.unwrap().is_none());

        db.close().await.unwrap();
    }
}
