// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use courier_config::model::ServerConfig;
use courier_core::{CourierError, EntityStore, SearchIndex};
use courier_sequencer::{SequenceAllocator, TokenGenerator};

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The durable entity store (also hosts the task queue).
    pub store: Arc<dyn EntityStore>,
    /// Sequence allocator for chat and message numbers.
    pub allocator: SequenceAllocator,
    /// Application token generator.
    pub tokens: TokenGenerator,
    /// Full-text search index (read side only; writes happen in the runner).
    pub index: Arc<dyn SearchIndex>,
    /// Attempt budget stamped on every enqueued task.
    pub task_max_attempts: i64,
}

/// Build the gateway router.
///
/// Routes:
/// - GET  /health (unauthenticated liveness)
/// - POST/GET /v1/applications
/// - POST/GET /v1/applications/{token}/chats
/// - POST/GET /v1/applications/{token}/chats/{number}/messages
/// - GET  /v1/applications/{token}/chats/{number}/messages/search
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route(
            "/v1/applications",
            post(handlers::create_application).get(handlers::list_applications),
        )
        .route(
            "/v1/applications/{token}/chats",
            post(handlers::create_chat).get(handlers::list_chats),
        )
        .route(
            "/v1/applications/{token}/chats/{number}/messages",
            post(handlers::create_message).get(handlers::list_messages),
        )
        .route(
            "/v1/applications/{token}/chats/{number}/messages/search",
            get(handlers::search_messages),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the gateway HTTP server and serve until the process exits.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), CourierError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CourierError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| CourierError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
