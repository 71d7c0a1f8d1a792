// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Application table operations.

use courier_core::CourierError;
use rusqlite::{params, OptionalExtension};

use crate::database::{is_unique_violation, map_tr_err, Database};
use crate::models::Application;

const COLUMNS: &str = "id, name, token, chats_count, created_at";

/// Insert a new application. The token must be globally unique; a
/// duplicate surfaces as `Conflict`, which is how a redelivered
/// CreateApplication task detects an already-applied write.
pub async fn create(db: &Database, name: &str, token: &str) -> Result<Application, CourierError> {
    let name = name.to_string();
    let token = token.to_string();
    db.connection()
        .call(move |conn| {
            match conn.execute(
                "INSERT INTO applications (name, token) VALUES (?1, ?2)",
                params![name, token],
            ) {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    return Ok(Err(CourierError::Conflict {
                        resource: format!("application token {token}"),
                    }));
                }
                Err(e) => return Err(e),
            }
            let id = conn.last_insert_rowid();
            let application = conn.query_row(
                &format!("SELECT {COLUMNS} FROM applications WHERE id = ?1"),
                params![id],
                row_to_application,
            )?;
            Ok(Ok(application))
        })
        .await
        .map_err(map_tr_err)?
}

/// Look up an application by its external token.
pub async fn get_by_token(db: &Database, token: &str) -> Result<Option<Application>, CourierError> {
    let token = token.to_string();
    db.connection()
        .call(move |conn| {
            let application = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM applications WHERE token = ?1"),
                    params![token],
                    row_to_application,
                )
                .optional()?;
            Ok(application)
        })
        .await
        .map_err(map_tr_err)
}

/// List all applications in creation order.
pub async fn list_all(db: &Database) -> Result<Vec<Application>, CourierError> {
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {COLUMNS} FROM applications ORDER BY id ASC"))?;
            let applications = stmt
                .query_map([], row_to_application)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(applications)
        })
        .await
        .map_err(map_tr_err)
}

fn row_to_application(row: &rusqlite::Row) -> Result<Application, rusqlite::Error> {
    Ok(Application {
        id: row.get(0)?,
        name: row.get(1)?,
        token: row.get(2)?,
        chats_count: row.get(3)?,
        created_at: row.get(4)?,
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
    async fn create_and_get_by_token() {
        let (db, _dir) = setup_db().await;

        let app = create(&db, "Demo", "tok-demo-1").await.unwrap();
        assert!(app.id > 0);
        assert_eq!(app.name, "Demo");
        assert_eq!(app.chats_count, 0);
        assert!(!app.created_at.is_empty());

        let found = get_by_token(&db, "tok-demo-1").await.unwrap().unwrap();
        assert_eq!(found.id, app.id);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_by_unknown_token_is_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_by_token(&db, "missing").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_token_is_conflict() {
        let (db, _dir) = setup_db().await;

        create(&db, "One", "tok-dup").await.unwrap();
        let err = create(&db, "Two", "tok-dup").await.unwrap_err();
        assert!(matches!(err, CourierError::Conflict { .. }), "got {err:?}");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_all_preserves_creation_order() {
        let (db, _dir) = setup_db().await;

        create(&db, "First", "tok-1").await.unwrap();
        create(&db, "Second", "tok-2").await.unwrap();

        let all = list_all(&db).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "First");
        assert_eq!(all[1].name, "Second");

        db.close().await.unwrap();
    }
}
