// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier status` command implementation.
//!
//! Opens each backend directly and reports its health plus the
//! dead-letter queue, so an operator can see permanently failed writes
//! without spelunking through logs.

use std::sync::Arc;

use serde_json::json;

use courier_config::model::CourierConfig;
use courier_core::types::HealthStatus;
use courier_core::{BackendAdapter, CourierError, EntityStore};
use courier_runner::WRITE_QUEUE;
use courier_search::SqliteSearchIndex;
use courier_sequencer::SqliteCounters;
use courier_storage::SqliteStore;

fn health_label(health: &HealthStatus) -> String {
    match health {
        HealthStatus::Healthy => "healthy".to_string(),
        HealthStatus::Degraded(reason) => format!("degraded ({reason})"),
        HealthStatus::Unhealthy(reason) => format!("unhealthy ({reason})"),
    }
}

/// Run the `courier status` command.
pub async fn run_status(config: &CourierConfig) -> Result<(), CourierError> {
    let store = Arc::new(SqliteStore::new(config.storage.clone()));
    store.initialize().await?;
    let counters = SqliteCounters::open(&config.counters.database_path).await?;
    let index = SqliteSearchIndex::open(&config.search.database_path).await?;

    let storage_health = store.health_check().await?;
    let counters_health = counters.health_check().await?;
    let index_health = index.health_check().await?;

    let dead = store.list_dead(WRITE_QUEUE).await?;
    let dead_summary: Vec<_> = dead
        .iter()
        .map(|entry| {
            json!({
                "id": entry.id,
                "attempts": entry.attempts,
                "payload": entry.payload,
                "updated_at": entry.updated_at,
            })
        })
        .collect();

    let report = json!({
        "storage": health_label(&storage_health),
        "counters": health_label(&counters_health),
        "search": health_label(&index_health),
        "dead_letter_count": dead.len(),
        "dead_letter": dead_summary,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
    );

    store.close().await?;
    Ok(())
}
