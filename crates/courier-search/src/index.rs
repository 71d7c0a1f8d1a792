// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite FTS5 implementation of the SearchIndex trait.
//!
//! Documents live in a plain table keyed by
//! `(application_token, chat_number, message_number)`; an external-content
//! FTS5 virtual table over the analyzed body provides BM25 ranking, with
//! sync triggers keeping the two in step. Tenant and chat scoping are
//! exact-match column filters, never part of the text match.

use async_trait::async_trait;
use rusqlite::params;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use courier_core::types::{AdapterType, HealthStatus, SearchDocument, SearchHit};
use courier_core::{BackendAdapter, CourierError, SearchIndex};

use crate::analyzer::{analyzed_body, phrase_prefix_query};

/// Convert tokio_rusqlite errors into `CourierError::Index`.
fn index_err(e: tokio_rusqlite::Error) -> CourierError {
    CourierError::Index {
        source: Box::new(e),
    }
}

/// DDL for the document table, FTS5 table, and sync triggers.
///
/// `porter unicode61` tokenizes with lowercasing and Porter stemming, so
/// "Searching" in a body matches a query for "search".
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        application_token TEXT NOT NULL,
        chat_number INTEGER NOT NULL,
        message_number INTEGER NOT NULL,
        body TEXT NOT NULL,
        indexed_body TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        UNIQUE (application_token, chat_number, message_number)
    );

    CREATE VIRTUAL TABLE IF NOT EXISTS documents_fts USING fts5(
        indexed_body,
        content='documents',
        content_rowid='id',
        tokenize='porter unicode61'
    );

    CREATE TRIGGER IF NOT EXISTS documents_ai AFTER INSERT ON documents BEGIN
        INSERT INTO documents_fts(rowid, indexed_body) VALUES (new.id, new.indexed_body);
    END;

    CREATE TRIGGER IF NOT EXISTS documents_ad AFTER DELETE ON documents BEGIN
        INSERT INTO documents_fts(documents_fts, rowid, indexed_body)
            VALUES('delete', old.id, old.indexed_body);
    END;

    CREATE TRIGGER IF NOT EXISTS documents_au AFTER UPDATE ON documents BEGIN
        INSERT INTO documents_fts(documents_fts, rowid, indexed_body)
            VALUES('delete', old.id, old.indexed_body);
        INSERT INTO documents_fts(rowid, indexed_body) VALUES (new.id, new.indexed_body);
    END;

    CREATE INDEX IF NOT EXISTS idx_documents_scope
        ON documents(application_token, chat_number);
";

/// SQLite FTS5-backed search index.
pub struct SqliteSearchIndex {
    conn: Connection,
}

impl SqliteSearchIndex {
    /// Open (or create) the index database at `path`. Existing documents
    /// are preserved; use [`SearchIndex::setup`] to start from scratch.
    pub async fn open(path: &str) -> Result<Self, CourierError> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| index_err(e.into()))?;
        Self::prepare(conn).await
    }

    /// Open an in-memory index. Test use only.
    pub async fn open_in_memory() -> Result<Self, CourierError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| index_err(e.into()))?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self, CourierError> {
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;",
            )?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(index_err)?;
        debug!("search index opened");
        Ok(Self { conn })
    }
}

#[async_trait]
impl BackendAdapter for SqliteSearchIndex {
    fn name(&self) -> &str {
        "sqlite-fts"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Search
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(index_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(index_err)
    }
}

#[async_trait]
impl SearchIndex for SqliteSearchIndex {
    async fn setup(&self) -> Result<(), CourierError> {
        self.conn
            .call(|conn| {
                conn.execute_batch(
                    "DROP TRIGGER IF EXISTS documents_ai;
                     DROP TRIGGER IF EXISTS documents_ad;
                     DROP TRIGGER IF EXISTS documents_au;
                     DROP TABLE IF EXISTS documents_fts;
                     DROP TABLE IF EXISTS documents;",
                )?;
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await
            .map_err(index_err)?;
        info!("search index schema recreated");
        Ok(())
    }

    async fn index(&self, document: &SearchDocument) -> Result<(), CourierError> {
        let doc = document.clone();
        let indexed = analyzed_body(&doc.body);
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO documents
                         (application_token, chat_number, message_number, body, indexed_body, timestamp)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(application_token, chat_number, message_number) DO UPDATE SET
                         body = excluded.body,
                         indexed_body = excluded.indexed_body,
                         timestamp = excluded.timestamp",
                    params![
                        doc.application_token,
                        doc.chat_number,
                        doc.message_number,
                        doc.body,
                        indexed,
                        doc.timestamp
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(index_err)
    }

    async fn search(
        &self,
        application_token: &str,
        chat_number: i64,
        query: &str,
    ) -> Result<Vec<SearchHit>, CourierError> {
        // An all-stopword query analyzes to zero terms and matches nothing.
        let Some(match_expr) = phrase_prefix_query(query) else {
            return Ok(Vec::new());
        };
        let application_token = application_token.to_string();

        self.conn
            .call(move |conn| {
                // bm25() is negative, more negative = more relevant, so
                // ascending score order is relevance-descending.
                let mut stmt = conn.prepare(
                    "SELECT d.message_number, d.body, d.timestamp
                     FROM documents_fts
                     JOIN documents d ON d.id = documents_fts.rowid
                     WHERE documents_fts MATCH ?1
                       AND d.application_token = ?2
                       AND d.chat_number = ?3
                     ORDER BY bm25(documents_fts) ASC, d.timestamp DESC",
                )?;
                let hits = stmt
                    .query_map(params![match_expr, application_token, chat_number], |row| {
                        Ok(SearchHit {
                            message_number: row.get(0)?,
                            body: row.get(1)?,
                            timestamp: row.get(2)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(hits)
            })
            .await
            .map_err(index_err)
    }
}
