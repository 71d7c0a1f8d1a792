// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier serve` command implementation.
//!
//! Wires the entity store, counter store, search index, task runner, and
//! gateway together, then serves until a shutdown signal arrives. Workers
//! are cancelled cooperatively; an in-flight task finishes its current
//! attempt before its worker exits.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use courier_config::model::CourierConfig;
use courier_core::{BackendAdapter, CourierError, EntityStore};
use courier_gateway::{start_server, GatewayState};
use courier_runner::TaskRunner;
use courier_search::SqliteSearchIndex;
use courier_sequencer::{SequenceAllocator, SqliteCounters, TokenGenerator};
use courier_storage::SqliteStore;

/// Run the `courier serve` command.
pub async fn run_serve(config: CourierConfig) -> Result<(), CourierError> {
    info!("starting courier serve");

    let store = Arc::new(SqliteStore::new(config.storage.clone()));
    store.initialize().await?;

    let counters = Arc::new(SqliteCounters::open(&config.counters.database_path).await?);
    let allocator = SequenceAllocator::new(counters.clone());
    let tokens = TokenGenerator::new(counters.clone());

    let index = Arc::new(SqliteSearchIndex::open(&config.search.database_path).await?);

    let runner = Arc::new(TaskRunner::new(
        store.clone(),
        allocator.clone(),
        index.clone(),
        config.runner.clone(),
    ));
    let cancel = CancellationToken::new();
    let workers = runner.spawn(&cancel);

    let state = GatewayState {
        store: store.clone(),
        allocator,
        tokens,
        index: index.clone(),
        task_max_attempts: config.runner.max_attempts,
    };

    let server_config = config.server.clone();
    let server = tokio::spawn(async move { start_server(&server_config, state).await });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
        result = server => {
            match result {
                Ok(Ok(())) => info!("gateway exited"),
                Ok(Err(e)) => error!(error = %e, "gateway failed"),
                Err(e) => error!(error = %e, "gateway task panicked"),
            }
        }
    }

    // Stop accepting queue work and let in-flight attempts finish.
    cancel.cancel();
    for worker in workers {
        let _ = worker.await;
    }

    store.shutdown().await?;
    counters.shutdown().await?;
    index.shutdown().await?;

    info!("courier stopped");
    Ok(())
}
