// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier index` command implementation.
//!
//! The search index is a disposable projection; these commands are the
//! escape hatch when it diverges from the entity store. `setup` recreates
//! an empty schema, `rebuild` additionally replays every persisted
//! message.

use std::sync::Arc;

use tracing::info;

use courier_config::model::CourierConfig;
use courier_core::{CourierError, EntityStore, SearchIndex};
use courier_search::{rebuild_from_store, SqliteSearchIndex};
use courier_storage::SqliteStore;

/// Run `courier index setup`: drop and recreate the index schema.
pub async fn run_setup(config: &CourierConfig) -> Result<(), CourierError> {
    let index = SqliteSearchIndex::open(&config.search.database_path).await?;
    index.setup().await?;
    info!("search index schema created");
    println!("Search index created at {}", config.search.database_path);
    Ok(())
}

/// Run `courier index rebuild`: recreate the schema and re-index every
/// persisted message from the entity store.
pub async fn run_rebuild(config: &CourierConfig) -> Result<(), CourierError> {
    let store = Arc::new(SqliteStore::new(config.storage.clone()));
    store.initialize().await?;
    let index = SqliteSearchIndex::open(&config.search.database_path).await?;

    let indexed = rebuild_from_store(&index, store.as_ref()).await?;

    store.close().await?;
    println!("Search index rebuilt: {indexed} messages indexed");
    Ok(())
}
