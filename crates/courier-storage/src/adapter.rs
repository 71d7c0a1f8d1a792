// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the EntityStore trait.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use courier_config::model::StorageConfig;
use courier_core::types::{
    AdapterType, Application, Chat, HealthStatus, Message, Page, SearchDocument, TaskEntry,
};
use courier_core::{BackendAdapter, CourierError, EntityStore};

use crate::database::Database;
use crate::queries;

/// SQLite-backed entity store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily opened on the first call to
/// [`EntityStore::initialize`].
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given configuration.
    ///
    /// The database connection is not opened until [`EntityStore::initialize`]
    /// is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not
    /// initialized.
    fn db(&self) -> Result<&Database, CourierError> {
        self.db.get().ok_or_else(|| CourierError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl BackendAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        // Shutdown delegates to close if the DB was initialized.
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("entity store shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore for SqliteStore {
    async fn initialize(&self) -> Result<(), CourierError> {
        let db = Database::open(&self.config.database_path).await?;
        self.db.set(db).map_err(|_| CourierError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "entity store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), CourierError> {
        self.db()?.close().await
    }

    // --- Application operations ---

    async fn create_application(
        &self,
        name: &str,
        token: &str,
    ) -> Result<Application, CourierError> {
        queries::applications::create(self.db()?, name, token).await
    }

    async fn get_application_by_token(
        &self,
        token: &str,
    ) -> Result<Option<Application>, CourierError> {
        queries::applications::get_by_token(self.db()?, token).await
    }

    async fn list_applications(&self) -> Result<Vec<Application>, CourierError> {
        queries::applications::list_all(self.db()?).await
    }

    // --- Chat operations ---

    async fn create_chat(&self, application_id: i64, number: i64) -> Result<Chat, CourierError> {
        queries::chats::create(self.db()?, application_id, number).await
    }

    async fn get_chat_by_number(
        &self,
        application_id: i64,
        number: i64,
    ) -> Result<Option<Chat>, CourierError> {
        queries::chats::get_by_number(self.db()?, application_id, number).await
    }

    async fn list_chats(&self, application_id: i64) -> Result<Vec<Chat>, CourierError> {
        queries::chats::list_for_application(self.db()?, application_id).await
    }

    // --- Message operations ---

    async fn create_message(
        &self,
        chat_id: i64,
        number: i64,
        body: &str,
    ) -> Result<Message, CourierError> {
        queries::messages::create(self.db()?, chat_id, number, body).await
    }

    async fn list_messages(&self, chat_id: i64, page: i64) -> Result<Page<Message>, CourierError> {
        queries::messages::list_page(self.db()?, chat_id, page).await
    }

    async fn list_message_documents(&self) -> Result<Vec<SearchDocument>, CourierError> {
        queries::messages::list_documents(self.db()?).await
    }

    // --- Task queue operations ---

    async fn enqueue(
        &self,
        queue: &str,
        payload: &str,
        max_attempts: i64,
    ) -> Result<i64, CourierError> {
        queries::tasks::enqueue(self.db()?, queue, payload, max_attempts).await
    }

    async fn dequeue(&self, queue: &str) -> Result<Option<TaskEntry>, CourierError> {
        queries::tasks::dequeue(self.db()?, queue).await
    }

    async fn ack(&self, id: i64) -> Result<(), CourierError> {
        queries::tasks::ack(self.db()?, id).await
    }

    async fn fail(&self, id: i64, backoff: Duration) -> Result<(), CourierError> {
        queries::tasks::fail(self.db()?, id, backoff).await
    }

    async fn discard(&self, id: i64) -> Result<(), CourierError> {
        queries::tasks::discard(self.db()?, id).await
    }

    async fn reap_expired(&self, queue: &str) -> Result<u64, CourierError> {
        queries::tasks::reap_expired(self.db()?, queue).await
    }

    async fn list_dead(&self, queue: &str) -> Result<Vec<TaskEntry>, CourierError> {
        queries::tasks::list_dead(self.db()?, queue).await
    }
}
