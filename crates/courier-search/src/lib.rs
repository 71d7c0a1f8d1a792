// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full-text message index for the Courier messaging backend.
//!
//! The index is a best-effort projection of message bodies into a
//! dedicated SQLite database with an FTS5 virtual table. It is written
//! after the authoritative message transaction commits and is never the
//! source of truth; when it diverges, [`rebuild_from_store`] replays
//! every persisted message into a freshly set-up index.

pub mod analyzer;
pub mod index;

pub use index::SqliteSearchIndex;

use courier_core::{CourierError, EntityStore, SearchIndex};
use tracing::info;

/// Drop, recreate, and repopulate the index from the entity store.
///
/// Reconciliation tooling for index/store divergence; returns how many
/// documents were indexed.
pub async fn rebuild_from_store(
    index: &dyn SearchIndex,
    store: &dyn EntityStore,
) -> Result<usize, CourierError> {
    index.setup().await?;

    let documents = store.list_message_documents().await?;
    for document in &documents {
        index.index(document).await?;
    }

    info!(count = documents.len(), "search index rebuilt from entity store");
    Ok(documents.len())
}
