// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat table operations.

use courier_core::CourierError;
use rusqlite::{params, OptionalExtension};

use crate::database::{is_unique_violation, map_tr_err, Database};
use crate::models::Chat;

const COLUMNS: &str = "id, application_id, number, messages_count, created_at";

/// Insert a chat and increment the owning application's `chats_count`
/// inside one transaction.
///
/// A duplicate `(application_id, number)` aborts the transaction with
/// `Conflict` before the count is committed, so a redelivered CreateChat
/// task can neither double-insert nor double-increment.
pub async fn create(
    db: &Database,
    application_id: i64,
    number: i64,
) -> Result<Chat, CourierError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let parent_exists = tx
                .query_row(
                    "SELECT 1 FROM applications WHERE id = ?1",
                    params![application_id],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if !parent_exists {
                return Ok(Err(CourierError::not_found(format!(
                    "application {application_id}"
                ))));
            }

            match tx.execute(
                "INSERT INTO chats (application_id, number) VALUES (?1, ?2)",
                params![application_id, number],
            ) {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    // Dropping the transaction uncommitted rolls it back.
                    return Ok(Err(CourierError::Conflict {
                        resource: format!("chat {number} in application {application_id}"),
                    }));
                }
                Err(e) => return Err(e),
            }
            let id = tx.last_insert_rowid();

            tx.execute(
                "UPDATE applications SET chats_count = chats_count + 1 WHERE id = ?1",
                params![application_id],
            )?;

            let chat = tx.query_row(
                &format!("SELECT {COLUMNS} FROM chats WHERE id = ?1"),
                params![id],
                row_to_chat,
            )?;

            tx.commit()?;
            Ok(Ok(chat))
        })
        .await
        .map_err(map_tr_err)?
}

/// Look up a chat by its per-application number.
pub async fn get_by_number(
    db: &Database,
    application_id: i64,
    number: i64,
) -> Result<Option<Chat>, CourierError> {
    db.connection()
        .call(move |conn| {
            let chat = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM chats WHERE application_id = ?1 AND number = ?2"),
                    params![application_id, number],
                    row_to_chat,
                )
                .optional()?;
            Ok(chat)
        })
        .await
        .map_err(map_tr_err)
}

/// List an application's chats ordered by number ascending.
pub async fn list_for_application(
    db: &Database,
    application_id: i64,
) -> Result<Vec<Chat>, CourierError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM chats WHERE application_id = ?1 ORDER BY number ASC"
            ))?;
            let chats = stmt
                .query_map(params![application_id], row_to_chat)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(chats)
        })
        .await
        .map_err(map_tr_err)
}

fn row_to_chat(row: &rusqlite::Row) -> Result<Chat, rusqlite::Error> {
    Ok(Chat {
        id: row.get(0)?,
        application_id: row.get(1)?,
        number: row.get(2)?,
        messages_count: row.get(3)?,
        created_at: row.get(4)?,
    })
}
