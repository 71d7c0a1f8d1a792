// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker pool consuming the persistent write queue.
//!
//! Each worker claims one entry at a time, replays it against the entity
//! store, and acknowledges or fails it. Retried entries back off
//! exponentially; deterministic failures and exhausted budgets land in
//! the dead-letter state with a critical log so they never vanish
//! silently.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use courier_config::model::RunnerConfig;
use courier_core::types::{SearchDocument, TaskEntry};
use courier_core::{CourierError, EntityStore, SearchIndex};
use courier_sequencer::{Scope, SequenceAllocator};

use crate::task::{Task, WRITE_QUEUE};

/// Enqueue a task on the shared write queue.
pub async fn enqueue(
    store: &dyn EntityStore,
    task: &Task,
    max_attempts: i64,
) -> Result<i64, CourierError> {
    store
        .enqueue(WRITE_QUEUE, &task.to_payload()?, max_attempts)
        .await
}

/// The async task runner.
///
/// Holds the collaborators every handler needs and drives the worker
/// pool. Handlers are safe to retry: the store's unique constraints turn
/// a redelivered create into a detectable `Conflict`, which is treated
/// as an idempotent no-op.
pub struct TaskRunner {
    store: Arc<dyn EntityStore>,
    allocator: SequenceAllocator,
    index: Arc<dyn SearchIndex>,
    config: RunnerConfig,
}

impl TaskRunner {
    pub fn new(
        store: Arc<dyn EntityStore>,
        allocator: SequenceAllocator,
        index: Arc<dyn SearchIndex>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            store,
            allocator,
            index,
            config,
        }
    }

    /// Spawn the configured number of workers. They run until `cancel`
    /// fires; an in-flight task finishes its current attempt first.
    pub fn spawn(self: Arc<Self>, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
        info!(workers = self.config.workers, "starting task runner");
        (0..self.config.workers)
            .map(|worker_id| {
                let runner = Arc::clone(&self);
                let cancel = cancel.clone();
                tokio::spawn(runner.worker_loop(cancel, worker_id))
            })
            .collect()
    }

    async fn worker_loop(self: Arc<Self>, cancel: CancellationToken, worker_id: usize) {
        debug!(worker_id, "worker started");
        let idle = Duration::from_millis(self.config.poll_interval_ms);
        loop {
            if cancel.is_cancelled() {
                break;
            }
            match self.process_next().await {
                // Something was processed; poll again immediately.
                Ok(true) => {}
                Ok(false) => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(idle) => {}
                    }
                }
                Err(e) => {
                    error!(worker_id, error = %e, "queue poll failed");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(idle) => {}
                    }
                }
            }
        }
        debug!(worker_id, "worker stopped");
    }

    /// Claim and process at most one queue entry. Returns whether an
    /// entry was processed. Exposed so tests can drive the queue
    /// deterministically.
    pub async fn process_next(&self) -> Result<bool, CourierError> {
        self.store.reap_expired(WRITE_QUEUE).await?;
        match self.store.dequeue(WRITE_QUEUE).await? {
            Some(entry) => {
                self.process_entry(entry).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Process entries until the queue has nothing runnable.
    pub async fn drain(&self) -> Result<(), CourierError> {
        while self.process_next().await? {}
        Ok(())
    }

    async fn process_entry(&self, entry: TaskEntry) {
        let task = match Task::from_payload(&entry.payload) {
            Ok(task) => task,
            Err(e) => {
                error!(
                    task_id = entry.id,
                    error = %e,
                    dead_letter = true,
                    "unparseable task payload discarded"
                );
                if let Err(e) = self.store.discard(entry.id).await {
                    error!(task_id = entry.id, error = %e, "failed to discard task");
                }
                return;
            }
        };

        match self.handle(&task).await {
            Ok(()) => {
                if let Err(e) = self.store.ack(entry.id).await {
                    // The attempt succeeded but the ack did not; the entry
                    // will be redelivered and resolve as a Conflict no-op.
                    error!(task_id = entry.id, error = %e, "failed to ack task");
                }
            }
            Err(e) if e.is_retryable() && entry.attempts + 1 < entry.max_attempts => {
                let backoff = self.backoff_for(entry.attempts);
                warn!(
                    task_id = entry.id,
                    kind = task.kind(),
                    attempt = entry.attempts + 1,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "task failed, retry scheduled"
                );
                if let Err(e) = self.store.fail(entry.id, backoff).await {
                    error!(task_id = entry.id, error = %e, "failed to reschedule task");
                }
            }
            Err(e) => {
                // Terminal: retry budget spent, or the failure is
                // deterministic and retrying cannot help. Give the
                // allocated number back where it can still be taken back.
                self.release_allocation(&task).await;
                error!(
                    task_id = entry.id,
                    kind = task.kind(),
                    attempts = entry.attempts + 1,
                    error = %e,
                    dead_letter = true,
                    "task permanently failed"
                );
                let result = if e.is_retryable() {
                    self.store.fail(entry.id, Duration::ZERO).await
                } else {
                    self.store.discard(entry.id).await
                };
                if let Err(e) = result {
                    error!(task_id = entry.id, error = %e, "failed to dead-letter task");
                }
            }
        }
    }

    async fn handle(&self, task: &Task) -> Result<(), CourierError> {
        match task {
            Task::CreateApplication { name, token } => {
                match self.store.create_application(name, token).await {
                    Ok(application) => {
                        info!(
                            application_token = %application.token,
                            "application created"
                        );
                        Ok(())
                    }
                    Err(CourierError::Conflict { resource }) => {
                        debug!(%resource, "replayed create ignored");
                        Ok(())
                    }
                    Err(e) => {
                        error!(application_token = %token, error = %e, "application creation failed");
                        Err(e)
                    }
                }
            }

            Task::CreateChat {
                application_token,
                number,
            } => {
                let application = self
                    .store
                    .get_application_by_token(application_token)
                    .await?
                    .ok_or_else(|| {
                        CourierError::not_found(format!("application {application_token}"))
                    })?;

                match self.store.create_chat(application.id, *number).await {
                    Ok(chat) => {
                        info!(
                            application_token = %application_token,
                            chat_number = chat.number,
                            "chat created"
                        );
                        Ok(())
                    }
                    Err(CourierError::Conflict { resource }) => {
                        debug!(%resource, "replayed create ignored");
                        Ok(())
                    }
                    Err(e) => {
                        error!(
                            application_token = %application_token,
                            chat_number = number,
                            error = %e,
                            "chat creation failed"
                        );
                        Err(e)
                    }
                }
            }

            Task::SendMessage {
                application_token,
                chat_number,
                number,
                body,
            } => {
                let application = self
                    .store
                    .get_application_by_token(application_token)
                    .await?
                    .ok_or_else(|| {
                        CourierError::not_found(format!("application {application_token}"))
                    })?;
                let chat = self
                    .store
                    .get_chat_by_number(application.id, *chat_number)
                    .await?
                    .ok_or_else(|| {
                        CourierError::not_found(format!(
                            "chat {chat_number} in application {application_token}"
                        ))
                    })?;

                let message = match self.store.create_message(chat.id, *number, body).await {
                    Ok(message) => message,
                    Err(CourierError::Conflict { resource }) => {
                        // Already persisted by an earlier delivery; the
                        // index upsert for it either happened then or will
                        // be restored by a rebuild.
                        debug!(%resource, "replayed create ignored");
                        return Ok(());
                    }
                    Err(e) => {
                        error!(
                            application_token = %application_token,
                            chat_number,
                            message_number = number,
                            error = %e,
                            "message creation failed"
                        );
                        return Err(e);
                    }
                };

                info!(
                    application_token = %application_token,
                    chat_number,
                    message_number = message.number,
                    "message created"
                );

                // Indexing runs after the commit and never fails the task:
                // search is a projection, not the system of record.
                let document = SearchDocument {
                    application_token: application_token.clone(),
                    chat_number: *chat_number,
                    message_number: message.number,
                    body: message.body.clone(),
                    timestamp: message.created_at.clone(),
                };
                if let Err(e) = self.index.index(&document).await {
                    warn!(
                        application_token = %application_token,
                        chat_number,
                        message_number = message.number,
                        error = %e,
                        "failed to index message; projection lags until rebuild"
                    );
                }

                Ok(())
            }
        }
    }

    /// Compensating release of the task's sequence number, for tasks that
    /// will never persist it.
    ///
    /// Guarded by the allocator's compare-and-swap: only the latest
    /// allocation can be reclaimed, anything else stays a permanent,
    /// logged gap. An application create has no allocation to release.
    async fn release_allocation(&self, task: &Task) {
        let released = match task {
            Task::CreateApplication { .. } => return,

            Task::CreateChat {
                application_token,
                number,
            } => match self.store.get_application_by_token(application_token).await {
                Ok(Some(application)) => self
                    .allocator
                    .release(
                        Scope::Chats {
                            application_id: application.id,
                        },
                        *number,
                    )
                    .await
                    .map(Some),
                Ok(None) => Ok(None),
                Err(e) => Err(e),
            },

            Task::SendMessage {
                application_token,
                chat_number,
                number,
                ..
            } => {
                let chat = match self.store.get_application_by_token(application_token).await {
                    Ok(Some(application)) => {
                        self.store
                            .get_chat_by_number(application.id, *chat_number)
                            .await
                    }
                    Ok(None) => Ok(None),
                    Err(e) => Err(e),
                };
                match chat {
                    Ok(Some(chat)) => self
                        .allocator
                        .release(Scope::Messages { chat_id: chat.id }, *number)
                        .await
                        .map(Some),
                    Ok(None) => Ok(None),
                    Err(e) => Err(e),
                }
            }
        };

        match released {
            Ok(Some(_)) => {} // allocator logs the lost-race case itself
            Ok(None) => warn!(
                kind = task.kind(),
                "parent unresolved, sequence number not released"
            ),
            Err(e) => warn!(
                kind = task.kind(),
                error = %e,
                "compensating release failed"
            ),
        }
    }

    fn backoff_for(&self, attempts: i64) -> Duration {
        let shift = attempts.clamp(0, 16) as u32;
        Duration::from_millis(self.config.retry_base_ms.saturating_mul(1 << shift))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_config::model::StorageConfig;
    use courier_search::SqliteSearchIndex;
    use courier_sequencer::SqliteCounters;
    use courier_storage::SqliteStore;
    use tempfile::tempdir;

    struct Fixture {
        runner: TaskRunner,
        store: Arc<SqliteStore>,
        allocator: SequenceAllocator,
        index: Arc<SqliteSearchIndex>,
        _dir: tempfile::TempDir,
    }

    async fn setup() -> Fixture {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("store.db");
        let store = Arc::new(SqliteStore::new(StorageConfig {
            database_path: db_path.to_str().unwrap().to_string(),
        }));
        store.initialize().await.unwrap();

        let counters = Arc::new(SqliteCounters::open_in_memory().await.unwrap());
        let allocator = SequenceAllocator::new(counters);
        let index = Arc::new(SqliteSearchIndex::open_in_memory().await.unwrap());

        let runner = TaskRunner::new(
            store.clone(),
            allocator.clone(),
            index.clone(),
            RunnerConfig {
                workers: 1,
                max_attempts: 3,
                retry_base_ms: 1,
                poll_interval_ms: 5,
            },
        );
        Fixture {
            runner,
            store,
            allocator,
            index,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn create_application_task_persists() {
        let f = setup().await;

        let task = Task::CreateApplication {
            name: "Demo".into(),
            token: "tok-1".into(),
        };
        enqueue(f.store.as_ref(), &task, 3).await.unwrap();
        f.runner.drain().await.unwrap();

        let apps = f.store.list_applications().await.unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].name, "Demo");
        assert_eq!(apps[0].chats_count, 0);
    }

    #[tokio::test]
    async fn full_write_pipeline_persists_and_indexes() {
        let f = setup().await;

        enqueue(
            f.store.as_ref(),
            &Task::CreateApplication {
                name: "Demo".into(),
                token: "tok-1".into(),
            },
            3,
        )
        .await
        .unwrap();
        f.runner.drain().await.unwrap();

        let app = f.store.get_application_by_token("tok-1").await.unwrap().unwrap();
        let chat_number = f
            .allocator
            .allocate(Scope::Chats {
                application_id: app.id,
            })
            .await
            .unwrap();
        enqueue(
            f.store.as_ref(),
            &Task::CreateChat {
                application_token: "tok-1".into(),
                number: chat_number,
            },
            3,
        )
        .await
        .unwrap();
        f.runner.drain().await.unwrap();

        let chat = f.store.get_chat_by_number(app.id, chat_number).await.unwrap().unwrap();
        let message_number = f
            .allocator
            .allocate(Scope::Messages { chat_id: chat.id })
            .await
            .unwrap();
        enqueue(
            f.store.as_ref(),
            &Task::SendMessage {
                application_token: "tok-1".into(),
                chat_number,
                number: message_number,
                body: "Hi there!".into(),
            },
            3,
        )
        .await
        .unwrap();
        f.runner.drain().await.unwrap();

        // Row, counts, and projection all present.
        let page = f.store.list_messages(chat.id, 1).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].body, "Hi there!");

        let chat = f.store.get_chat_by_number(app.id, chat_number).await.unwrap().unwrap();
        assert_eq!(chat.messages_count, 1);

        let hits = f.index.search("tok-1", chat_number, "hi").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].message_number, message_number);
    }

    #[tokio::test]
    async fn redelivered_send_message_is_idempotent() {
        let f = setup().await;

        let app = f.store.create_application("Demo", "tok-1").await.unwrap();
        let chat = f.store.create_chat(app.id, 1).await.unwrap();

        let task = Task::SendMessage {
            application_token: "tok-1".into(),
            chat_number: 1,
            number: 1,
            body: "once".into(),
        };

        // Deliver the same task twice, as an at-least-once queue may.
        enqueue(f.store.as_ref(), &task, 3).await.unwrap();
        f.runner.drain().await.unwrap();
        enqueue(f.store.as_ref(), &task, 3).await.unwrap();
        f.runner.drain().await.unwrap();

        let page = f.store.list_messages(chat.id, 1).await.unwrap();
        assert_eq!(page.items.len(), 1, "no duplicate row");

        let chat = f.store.get_chat_by_number(app.id, 1).await.unwrap().unwrap();
        assert_eq!(chat.messages_count, 1, "no double increment");

        // Both deliveries acked; nothing dead-lettered.
        assert!(f.store.list_dead(WRITE_QUEUE).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unparseable_payload_goes_to_dead_letter() {
        let f = setup().await;

        f.store.enqueue(WRITE_QUEUE, "not json", 3).await.unwrap();
        f.runner.drain().await.unwrap();

        let dead = f.store.list_dead(WRITE_QUEUE).await.unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].payload, "not json");
    }

    #[tokio::test]
    async fn missing_parent_dead_letters_without_burning_retries() {
        let f = setup().await;

        let task = Task::CreateChat {
            application_token: "no-such-app".into(),
            number: 1,
        };
        enqueue(f.store.as_ref(), &task, 3).await.unwrap();
        f.runner.drain().await.unwrap();

        let dead = f.store.list_dead(WRITE_QUEUE).await.unwrap();
        assert_eq!(dead.len(), 1);
        // Discarded on the first attempt: NotFound is deterministic.
        assert_eq!(dead[0].attempts, 0);
    }

    #[tokio::test]
    async fn worker_pool_processes_in_background() {
        let f = setup().await;
        let runner = Arc::new(f.runner);
        let cancel = CancellationToken::new();
        let handles = runner.spawn(&cancel);

        enqueue(
            f.store.as_ref(),
            &Task::CreateApplication {
                name: "Background".into(),
                token: "tok-bg".into(),
            },
            3,
        )
        .await
        .unwrap();

        // Wait for the pool to pick it up.
        let mut persisted = false;
        for _ in 0..100 {
            if f.store
                .get_application_by_token("tok-bg")
                .await
                .unwrap()
                .is_some()
            {
                persisted = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(persisted, "worker pool never persisted the application");

        cancel.cancel();
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
