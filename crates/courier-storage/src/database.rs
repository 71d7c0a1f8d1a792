// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use courier_core::CourierError;
use tokio_rusqlite::Connection;

/// Handle to the entity store database.
///
/// Wraps a single `tokio_rusqlite::Connection`; all query modules accept
/// `&Database` and go through [`Database::connection`], which keeps every
/// write on one background thread.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs, and run
    /// pending migrations.
    pub async fn open(path: &str) -> Result<Self, CourierError> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| map_tr_err(e.into()))?;
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )?;
            Ok(crate::migrations::run_migrations(conn))
        })
        .await
        .map_err(map_tr_err)??;

        Ok(Self { conn })
    }

    /// The underlying single-writer connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(&self) -> Result<(), CourierError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Convert tokio_rusqlite errors into `CourierError::Storage`.
///
/// Domain outcomes (not-found parents, duplicate numbers) never travel
/// this path: query closures return them in their `Ok` payload, so
/// anything arriving here is a genuine infrastructure failure.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> CourierError {
    CourierError::Storage {
        source: Box::new(e),
    }
}

// SQLITE_CONSTRAINT_UNIQUE / SQLITE_CONSTRAINT_PRIMARYKEY. Foreign-key
// violations share the primary ConstraintViolation code and must not be
// mistaken for duplicates.
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;
const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;

/// Whether a rusqlite error is a unique-constraint violation.
///
/// The create queries check this inside their transaction so a
/// redelivered write surfaces as [`CourierError::Conflict`] instead of an
/// infrastructure failure.
pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == SQLITE_CONSTRAINT_UNIQUE
                || err.extended_code == SQLITE_CONSTRAINT_PRIMARYKEY
    )
}
