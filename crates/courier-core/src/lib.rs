// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Courier messaging backend.
//!
//! This crate provides the error type, domain types, and backend adapter
//! traits used throughout the Courier workspace. The adapter traits define
//! the boundary to the three external collaborators: the durable entity
//! store, the atomic counter store, and the full-text search index.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CourierError;
pub use types::{
    AdapterType, Application, Chat, HealthStatus, Message, Page, SearchDocument, SearchHit,
    TaskEntry, PAGE_SIZE,
};

// Re-export all adapter traits at crate root.
pub use traits::{BackendAdapter, CounterStore, EntityStore, SearchIndex};
