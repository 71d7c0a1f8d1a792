// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Courier messaging backend.

use thiserror::Error;

/// The primary error type used across all Courier adapter traits and core
/// operations.
///
/// Variants split into client errors (`Validation`, `NotFound`, `Conflict`),
/// which must never be retried, and infrastructure errors (`Storage`,
/// `Counter`, `Queue`), which the async task runner retries with backoff.
/// `Index` failures are logged and swallowed by callers on the write path;
/// search is a best-effort projection, never the system of record.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed or out-of-bounds input on a request field.
    #[error("validation failed on {field}: {message}")]
    Validation { field: String, message: String },

    /// A referenced application or chat does not exist.
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// A unique constraint rejected a write, typically a redelivered task
    /// replaying an already-persisted `(parent, number)` pair.
    #[error("conflict: {resource} already exists")]
    Conflict { resource: String },

    /// Relational store errors (connection, query failure, transaction rollback).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Counter store errors (sequence allocation, token tracking).
    #[error("counter store error: {source}")]
    Counter {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Task queue errors (enqueue, dequeue, ack/fail bookkeeping).
    #[error("queue error: {source}")]
    Queue {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Search index errors. Never propagated past the indexing call site on
    /// the write path.
    #[error("search index error: {source}")]
    Index {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// Whether a failed operation may succeed on a later attempt.
    ///
    /// Infrastructure failures are transient by assumption; client errors
    /// and conflicts are deterministic and retrying them only burns the
    /// retry budget.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::Counter { .. } | Self::Queue { .. } | Self::Internal(_)
        )
    }

    /// Shorthand for a `NotFound` with a preformatted resource description.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Shorthand for a `Validation` error on a named field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
