// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message table operations.

use courier_core::{CourierError, PAGE_SIZE};
use rusqlite::{params, OptionalExtension};

use crate::database::{is_unique_violation, map_tr_err, Database};
use crate::models::{Message, Page, SearchDocument};

const COLUMNS: &str = "id, chat_id, number, body, created_at";

/// Insert a message and increment the owning chat's `messages_count`
/// inside one transaction.
///
/// Mirrors [`crate::queries::chats::create`]: a duplicate
/// `(chat_id, number)` aborts before the count is committed.
pub async fn create(
    db: &Database,
    chat_id: i64,
    number: i64,
    body: &str,
) -> Result<Message, CourierError> {
    let body = body.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let parent_exists = tx
                .query_row("SELECT 1 FROM chats WHERE id = ?1", params![chat_id], |_| Ok(()))
                .optional()?
                .is_some();
            if !parent_exists {
                return Ok(Err(CourierError::not_found(format!("chat {chat_id}"))));
            }

            match tx.execute(
                "INSERT INTO messages (chat_id, number, body) VALUES (?1, ?2, ?3)",
                params![chat_id, number, body],
            ) {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    return Ok(Err(CourierError::Conflict {
                        resource: format!("message {number} in chat {chat_id}"),
                    }));
                }
                Err(e) => return Err(e),
            }
            let id = tx.last_insert_rowid();

            tx.execute(
                "UPDATE chats SET messages_count = messages_count + 1 WHERE id = ?1",
                params![chat_id],
            )?;

            let message = tx.query_row(
                &format!("SELECT {COLUMNS} FROM messages WHERE id = ?1"),
                params![id],
                row_to_message,
            )?;

            tx.commit()?;
            Ok(Ok(message))
        })
        .await
        .map_err(map_tr_err)?
}

/// One page of a chat's messages ordered by number ascending.
///
/// `page` is 1-based and clamped to at least 1; the page size is fixed at
/// [`PAGE_SIZE`].
pub async fn list_page(
    db: &Database,
    chat_id: i64,
    page: i64,
) -> Result<Page<Message>, CourierError> {
    let page = page.max(1);
    db.connection()
        .call(move |conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE chat_id = ?1",
                params![chat_id],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM messages WHERE chat_id = ?1
                 ORDER BY number ASC LIMIT ?2 OFFSET ?3"
            ))?;
            let items = stmt
                .query_map(params![chat_id, PAGE_SIZE, (page - 1) * PAGE_SIZE], row_to_message)?
                .collect::<Result<Vec<_>, _>>()?;

            let last_page = ((total + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
            Ok(Page {
                items,
                total,
                current_page: page,
                last_page,
                per_page: PAGE_SIZE,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Every persisted message joined with its chat number and application
/// token, as search documents. Used by the index rebuild tooling only;
/// the hot path indexes one document at a time.
pub async fn list_documents(db: &Database) -> Result<Vec<SearchDocument>, CourierError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT a.token, c.number, m.number, m.body, m.created_at
                 FROM messages m
                 JOIN chats c ON c.id = m.chat_id
                 JOIN applications a ON a.id = c.application_id
                 ORDER BY m.id ASC",
            )?;
            let documents = stmt
                .query_map([], |row| {
                    Ok(SearchDocument {
                        application_token: row.get(0)?,
                        chat_number: row.get(1)?,
                        message_number: row.get(2)?,
                        body: row.get(3)?,
                        timestamp: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(documents)
        })
        .await
        .map_err(map_tr_err)
}

fn row_to_message(row: &rusqlite::Row) -> Result<Message, rusqlite::Error> {
    Ok(Message {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        number: row.get(2)?,
        body: row.get(3)?,
        created_at: row.get(4)?,
    })
}
