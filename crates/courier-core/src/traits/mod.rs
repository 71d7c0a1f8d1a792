// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend adapter trait definitions.
//!
//! All adapters extend the [`BackendAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility. These traits are
//! the interface boundary to Courier's external collaborators: the
//! relational entity store, the atomic counter store, and the full-text
//! search index.

pub mod adapter;
pub mod counter;
pub mod search;
pub mod storage;

// Re-export all traits at the traits module level for convenience.
pub use adapter::BackendAdapter;
pub use counter::CounterStore;
pub use search::SearchIndex;
pub use storage::EntityStore;
