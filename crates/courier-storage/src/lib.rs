// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Courier messaging backend.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, and typed query
//! modules for applications, chats, messages, and the crash-safe task
//! queue.
//!
//! The single-writer model is what serializes sibling creations under one
//! parent: every child-insert + parent-count-increment transaction runs
//! exclusively on the connection's background thread, so the denormalized
//! counts cannot lose updates.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStore;
pub use database::Database;
