// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Courier workspace.
//!
//! Timestamps are RFC 3339 strings throughout; the relational store keeps
//! them as TEXT and nothing in the system does timestamp arithmetic on the
//! entity types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Fixed page size for message listing.
pub const PAGE_SIZE: i64 = 20;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of backend adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum AdapterType {
    Storage,
    Counter,
    Search,
}

/// A tenant application. Owns chats; addressed externally only by `token`.
///
/// `id` is the internal surrogate key and must never appear in an API
/// response. `chats_count` is a denormalized count of persisted chats and
/// may transiently under-count while creation tasks are in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub name: String,
    pub token: String,
    pub chats_count: i64,
    pub created_at: String,
}

/// A chat within an application, identified by a per-application `number`
/// starting at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub application_id: i64,
    pub number: i64,
    pub messages_count: i64,
    pub created_at: String,
}

/// A message within a chat, identified by a per-chat `number` starting at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub chat_id: i64,
    pub number: i64,
    pub body: String,
    pub created_at: String,
}

/// A message projected into the search index.
///
/// Derived from [`Message`] after the row is committed; the index may lag
/// or transiently diverge from the entity store and is never the source of
/// truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub application_token: String,
    pub chat_number: i64,
    pub message_number: i64,
    pub body: String,
    pub timestamp: String,
}

/// A single search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub message_number: i64,
    pub body: String,
    pub timestamp: String,
}

/// One page of an ordered listing, with the pagination metadata the API
/// layer serializes under `meta`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub current_page: i64,
    pub last_page: i64,
    pub per_page: i64,
}

/// A persisted task queue entry.
///
/// Lifecycle: `pending` -> `processing` -> `completed`, with `fail`
/// transitions back to `pending` (retry, gated by `run_after`) until the
/// attempt budget is spent, then terminal `failed` (the dead-letter state).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEntry {
    pub id: i64,
    pub queue: String,
    pub payload: String,
    pub status: String,
    pub attempts: i64,
    pub max_attempts: i64,
    pub created_at: String,
    pub updated_at: String,
    /// Earliest time the entry may be dequeued again after a failure.
    pub run_after: Option<String>,
    /// Processing-lock deadline; entries past it are reaped back to pending.
    pub locked_until: Option<String>,
}
