// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entity store trait: the durable, transactional system of record.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CourierError;
use crate::traits::adapter::BackendAdapter;
use crate::types::{Application, Chat, Message, Page, SearchDocument, TaskEntry};

/// Adapter for the relational system of record.
///
/// Every `create_*` write runs in a single transaction that inserts the
/// child row and increments the parent's denormalized count; any failure
/// rolls the whole transaction back, so no partial entity+count state is
/// ever committed. Duplicate `(parent, number)` writes are rejected by
/// unique constraints and surface as [`CourierError::Conflict`], which is
/// how redelivered tasks detect an already-applied write.
///
/// The store also hosts the persistent task queue consumed by the async
/// task runner. Queue delivery is at-least-once: a `dequeue` claims an
/// entry under a processing lock, and entries whose lock expired are
/// reaped back to pending.
#[async_trait]
pub trait EntityStore: BackendAdapter {
    /// Opens the backing database and runs pending migrations.
    async fn initialize(&self) -> Result<(), CourierError>;

    /// Flushes pending writes and releases the connection.
    async fn close(&self) -> Result<(), CourierError>;

    // --- Application operations ---

    async fn create_application(&self, name: &str, token: &str)
        -> Result<Application, CourierError>;

    async fn get_application_by_token(&self, token: &str)
        -> Result<Option<Application>, CourierError>;

    async fn list_applications(&self) -> Result<Vec<Application>, CourierError>;

    // --- Chat operations ---

    /// Inserts a chat and increments the owning application's
    /// `chats_count` in the same transaction.
    async fn create_chat(&self, application_id: i64, number: i64) -> Result<Chat, CourierError>;

    async fn get_chat_by_number(
        &self,
        application_id: i64,
        number: i64,
    ) -> Result<Option<Chat>, CourierError>;

    /// Lists chats ordered by `number` ascending.
    async fn list_chats(&self, application_id: i64) -> Result<Vec<Chat>, CourierError>;

    // --- Message operations ---

    /// Inserts a message and increments the owning chat's `messages_count`
    /// in the same transaction.
    async fn create_message(
        &self,
        chat_id: i64,
        number: i64,
        body: &str,
    ) -> Result<Message, CourierError>;

    /// Lists one page of messages ordered by `number` ascending.
    /// `page` is 1-based; the page size is fixed at [`crate::PAGE_SIZE`].
    async fn list_messages(&self, chat_id: i64, page: i64) -> Result<Page<Message>, CourierError>;

    /// Streams every persisted message as a search document, joined with
    /// its owning chat and application. Reconciliation tooling only.
    async fn list_message_documents(&self) -> Result<Vec<SearchDocument>, CourierError>;

    // --- Task queue operations ---

    /// Enqueue a task payload with the given attempt budget. Returns the
    /// queue entry id.
    async fn enqueue(
        &self,
        queue: &str,
        payload: &str,
        max_attempts: i64,
    ) -> Result<i64, CourierError>;

    /// Atomically claim the oldest runnable pending entry, marking it
    /// `processing` under a lock deadline. `None` when nothing is runnable.
    async fn dequeue(&self, queue: &str) -> Result<Option<TaskEntry>, CourierError>;

    /// Acknowledge successful processing of a queue entry.
    async fn ack(&self, id: i64) -> Result<(), CourierError>;

    /// Record a failed attempt. Below the attempt budget the entry returns
    /// to `pending` with `run_after` pushed out by `backoff`; at the budget
    /// it moves to the terminal `failed` state.
    async fn fail(&self, id: i64, backoff: Duration) -> Result<(), CourierError>;

    /// Move an entry straight to the terminal `failed` state, skipping the
    /// remaining retry budget. Used for deterministic failures where
    /// retrying cannot help.
    async fn discard(&self, id: i64) -> Result<(), CourierError>;

    /// Return entries whose processing lock expired to `pending`.
    /// Returns how many entries were reaped.
    async fn reap_expired(&self, queue: &str) -> Result<u64, CourierError>;

    /// List entries in the terminal `failed` state, for operator visibility.
    async fn list_dead(&self, queue: &str) -> Result<Vec<TaskEntry>, CourierError>;
}
