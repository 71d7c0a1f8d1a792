// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Async task runner for the Courier messaging backend.
//!
//! The API layer acknowledges writes optimistically: it allocates the
//! sequence number synchronously, enqueues a task, and returns. This
//! crate is the other half of that contract. A pool of workers consumes
//! the persistent queue and replays each write against the entity store,
//! with at-least-once delivery, exponential backoff on transient
//! failures, compensating sequence release where a number can no longer
//! be persisted, and a dead-letter state for tasks that exhaust their
//! budget.

pub mod task;
pub mod worker;

pub use task::{Task, WRITE_QUEUE};
pub use worker::TaskRunner;
