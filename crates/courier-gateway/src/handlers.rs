// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the /v1 REST surface.
//!
//! Every create handler follows the same orchestration: validate input,
//! resolve the parent by external identity (404 if absent), allocate the
//! sequence number, enqueue the write task, and answer 201 with the
//! allocated number. Validation runs before allocation, so a rejected
//! request never consumes a number.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use courier_core::types::{Application, Chat, Message};
use courier_runner::{worker, Task};
use courier_sequencer::Scope;

use crate::server::GatewayState;

/// Maximum application name length, in characters.
const NAME_MAX_CHARS: usize = 255;

/// Maximum message body (and search query) size, in bytes.
const BODY_MAX_BYTES: usize = 65_535;

// --- Request/response bodies ---

/// Request body for POST /v1/applications.
#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    /// Application display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Request body for POST .../messages.
#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    /// Message text.
    #[serde(default)]
    pub body: Option<String>,
}

/// Query parameters for GET .../messages.
#[derive(Debug, Deserialize)]
pub struct ListMessagesParams {
    /// 1-based page number; defaults to the first page.
    #[serde(default)]
    pub page: Option<i64>,
}

/// Query parameters for GET .../messages/search.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Full-text query string.
    #[serde(default)]
    pub query: Option<String>,
}

/// An application as serialized in API responses. Internal ids stay
/// internal; the token is the only external identifier.
#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub name: String,
    pub token: String,
    pub chats_count: i64,
    pub created_at: String,
}

impl From<Application> for ApplicationResponse {
    fn from(application: Application) -> Self {
        Self {
            name: application.name,
            token: application.token,
            chats_count: application.chats_count,
            created_at: application.created_at,
        }
    }
}

/// A chat as serialized in API responses.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub number: i64,
    pub messages_count: i64,
    pub created_at: String,
}

impl From<Chat> for ChatResponse {
    fn from(chat: Chat) -> Self {
        Self {
            number: chat.number,
            messages_count: chat.messages_count,
            created_at: chat.created_at,
        }
    }
}

/// A message as serialized in API responses.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub number: i64,
    pub body: String,
    pub created_at: String,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            number: message.number,
            body: message.body,
            created_at: message.created_at,
        }
    }
}

/// Pagination metadata for GET .../messages.
#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub total: i64,
    pub current_page: i64,
    pub last_page: i64,
    pub per_page: i64,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// --- Handlers ---

/// GET /health
///
/// Unauthenticated liveness probe.
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /v1/applications
///
/// Issues the token synchronously, defers the insert to the task runner,
/// and acknowledges before persistence. The returned `created_at` is the
/// acknowledgement time; the store stamps its own on the eventual insert.
pub async fn create_application(
    State(state): State<GatewayState>,
    Json(body): Json<CreateApplicationRequest>,
) -> Response {
    let name = match body.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() && name.chars().count() <= NAME_MAX_CHARS => name,
        _ => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({
                    "message": "Validation failed",
                    "errors": { "name": "name is required and must be at most 255 characters" }
                })),
            )
                .into_response();
        }
    };

    let token = match state.tokens.generate().await {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "token generation failed");
            return infrastructure_error("Application creation failed", &e);
        }
    };

    let task = Task::CreateApplication {
        name: name.to_string(),
        token: token.clone(),
    };
    if let Err(e) = worker::enqueue(state.store.as_ref(), &task, state.task_max_attempts).await {
        error!(error = %e, "failed to enqueue application creation");
        return infrastructure_error("Application creation failed", &e);
    }

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Application creation request submitted",
            "data": {
                "name": name,
                "token": token,
                "created_at": chrono::Utc::now().to_rfc3339(),
            }
        })),
    )
        .into_response()
}

/// GET /v1/applications
pub async fn list_applications(State(state): State<GatewayState>) -> Response {
    match state.store.list_applications().await {
        Ok(applications) => {
            let body: Vec<ApplicationResponse> =
                applications.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to list applications");
            infrastructure_error("Failed to list applications", &e)
        }
    }
}

/// POST /v1/applications/{token}/chats
pub async fn create_chat(
    State(state): State<GatewayState>,
    Path(token): Path<String>,
) -> Response {
    let application = match state.store.get_application_by_token(&token).await {
        Ok(Some(application)) => application,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({
                    "message": "Application not found",
                    "error": "Invalid application token"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(application_token = %token, error = %e, "failed to resolve application");
            return infrastructure_error("Chat creation failed", &e);
        }
    };

    let scope = Scope::Chats {
        application_id: application.id,
    };
    let chat_number = match state.allocator.allocate(scope).await {
        Ok(number) => number,
        Err(e) => {
            error!(application_token = %token, error = %e, "chat number allocation failed");
            return infrastructure_error("Chat creation failed", &e);
        }
    };

    let task = Task::CreateChat {
        application_token: token.clone(),
        number: chat_number,
    };
    if let Err(e) = worker::enqueue(state.store.as_ref(), &task, state.task_max_attempts).await {
        // The number was handed out but its write will never run; give it
        // back while it is still the latest allocation.
        let _ = state.allocator.release(scope, chat_number).await;
        error!(application_token = %token, chat_number, error = %e, "failed to enqueue chat creation");
        return infrastructure_error("Chat creation failed", &e);
    }

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Chat creation request submitted",
            "data": { "chat_number": chat_number }
        })),
    )
        .into_response()
}

/// GET /v1/applications/{token}/chats
pub async fn list_chats(State(state): State<GatewayState>, Path(token): Path<String>) -> Response {
    let application = match state.store.get_application_by_token(&token).await {
        Ok(Some(application)) => application,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "message": "Application not found" })),
            )
                .into_response();
        }
        Err(e) => {
            error!(application_token = %token, error = %e, "failed to resolve application");
            return infrastructure_error("Failed to list chats", &e);
        }
    };

    match state.store.list_chats(application.id).await {
        Ok(chats) if chats.is_empty() => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "No chats found" })),
        )
            .into_response(),
        Ok(chats) => {
            let body: Vec<ChatResponse> = chats.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            error!(application_token = %token, error = %e, "failed to list chats");
            infrastructure_error("Failed to list chats", &e)
        }
    }
}

/// POST /v1/applications/{token}/chats/{number}/messages
pub async fn create_message(
    State(state): State<GatewayState>,
    Path((token, chat_number)): Path<(String, i64)>,
    Json(request): Json<CreateMessageRequest>,
) -> Response {
    // Validation precedes allocation: a rejected body must not consume a
    // sequence number.
    let body = match request.body.as_deref() {
        Some(body) if !body.is_empty() && body.len() <= BODY_MAX_BYTES => body,
        _ => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({
                    "status": "error",
                    "message": "Validation failed",
                    "errors": { "body": "body is required and must be at most 65535 bytes" }
                })),
            )
                .into_response();
        }
    };

    let chat = match resolve_chat(&state, &token, chat_number).await {
        Ok(Some(chat)) => chat,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({
                    "status": "error",
                    "message": "Application or Chat not found",
                    "errors": { "resource": "Application or Chat does not exist" }
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(application_token = %token, chat_number, error = %e, "failed to resolve chat");
            return message_server_error();
        }
    };

    let scope = Scope::Messages { chat_id: chat.id };
    let message_number = match state.allocator.allocate(scope).await {
        Ok(number) => number,
        Err(e) => {
            error!(application_token = %token, chat_number, error = %e, "message number allocation failed");
            return message_server_error();
        }
    };

    let task = Task::SendMessage {
        application_token: token.clone(),
        chat_number,
        number: message_number,
        body: body.to_string(),
    };
    if let Err(e) = worker::enqueue(state.store.as_ref(), &task, state.task_max_attempts).await {
        let _ = state.allocator.release(scope, message_number).await;
        error!(
            application_token = %token,
            chat_number,
            message_number,
            error = %e,
            "failed to enqueue message creation"
        );
        return message_server_error();
    }

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "message": "Message creation request submitted",
            "data": { "message_number": message_number }
        })),
    )
        .into_response()
}

/// GET /v1/applications/{token}/chats/{number}/messages
pub async fn list_messages(
    State(state): State<GatewayState>,
    Path((token, chat_number)): Path<(String, i64)>,
    Query(params): Query<ListMessagesParams>,
) -> Response {
    let chat = match resolve_chat(&state, &token, chat_number).await {
        Ok(Some(chat)) => chat,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({
                    "status": "error",
                    "message": "Application or Chat not found",
                    "errors": { "resource": "Application or Chat does not exist" }
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(application_token = %token, chat_number, error = %e, "failed to resolve chat");
            return message_server_error();
        }
    };

    match state
        .store
        .list_messages(chat.id, params.page.unwrap_or(1))
        .await
    {
        Ok(page) => {
            let data: Vec<MessageResponse> = page.items.into_iter().map(Into::into).collect();
            let meta = PageMeta {
                total: page.total,
                current_page: page.current_page,
                last_page: page.last_page,
                per_page: page.per_page,
            };
            (
                StatusCode::OK,
                Json(serde_json::json!({ "data": data, "meta": meta })),
            )
                .into_response()
        }
        Err(e) => {
            error!(application_token = %token, chat_number, error = %e, "failed to list messages");
            message_server_error()
        }
    }
}

/// GET /v1/applications/{token}/chats/{number}/messages/search
///
/// Reads the search projection directly; an unknown token or chat number
/// simply matches nothing. The projection may lag the store, so a
/// just-created message can be transiently absent here.
pub async fn search_messages(
    State(state): State<GatewayState>,
    Path((token, chat_number)): Path<(String, i64)>,
    Query(params): Query<SearchParams>,
) -> Response {
    let query = match params.query.as_deref() {
        Some(query) if !query.is_empty() && query.len() <= BODY_MAX_BYTES => query,
        _ => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({
                    "error": "Validation failed",
                    "messages": { "query": "Search query is required and must be at most 65535 bytes" }
                })),
            )
                .into_response();
        }
    };

    match state.index.search(&token, chat_number, query).await {
        Ok(hits) => (StatusCode::OK, Json(hits)).into_response(),
        Err(e) => {
            error!(application_token = %token, chat_number, error = %e, "search failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

// --- Helpers ---

async fn resolve_chat(
    state: &GatewayState,
    token: &str,
    chat_number: i64,
) -> Result<Option<Chat>, courier_core::CourierError> {
    let Some(application) = state.store.get_application_by_token(token).await? else {
        return Ok(None);
    };
    state
        .store
        .get_chat_by_number(application.id, chat_number)
        .await
}

fn infrastructure_error(message: &str, e: &courier_core::CourierError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "message": message, "error": e.to_string() })),
    )
        .into_response()
}

fn message_server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "status": "error",
            "message": "Internal server error",
            "errors": { "server": "An unexpected error occurred" }
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use courier_config::model::{RunnerConfig, StorageConfig};
    use courier_core::EntityStore;
    use courier_runner::TaskRunner;
    use courier_search::SqliteSearchIndex;
    use courier_sequencer::{SequenceAllocator, SqliteCounters, TokenGenerator};
    use courier_storage::SqliteStore;

    struct Fixture {
        router: axum::Router,
        store: Arc<SqliteStore>,
        runner: TaskRunner,
        _dir: tempfile::TempDir,
    }

    async fn setup() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("gateway.db");
        let store = Arc::new(SqliteStore::new(StorageConfig {
            database_path: db_path.to_str().unwrap().to_string(),
        }));
        store.initialize().await.unwrap();

        let counters = Arc::new(SqliteCounters::open_in_memory().await.unwrap());
        let allocator = SequenceAllocator::new(counters.clone());
        let tokens = TokenGenerator::new(counters);
        let index = Arc::new(SqliteSearchIndex::open_in_memory().await.unwrap());

        let runner = TaskRunner::new(
            store.clone(),
            allocator.clone(),
            index.clone(),
            RunnerConfig {
                workers: 1,
                max_attempts: 3,
                retry_base_ms: 1,
                poll_interval_ms: 5,
            },
        );

        let state = GatewayState {
            store: store.clone(),
            allocator,
            tokens,
            index,
            task_max_attempts: 3,
        };

        Fixture {
            router: crate::server::build_router(state),
            store,
            runner,
            _dir: dir,
        }
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_is_ok() {
        let f = setup().await;
        let response = f.router.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn create_application_then_list_it() {
        let f = setup().await;

        let response = f
            .router
            .clone()
            .oneshot(post_json("/v1/applications", serde_json::json!({"name": "Demo"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        let token = body["data"]["token"].as_str().unwrap().to_string();
        assert!(token.len() >= 16, "token too short: {token}");
        assert_eq!(body["data"]["name"], "Demo");

        // The write is deferred; drain the queue, then list.
        f.runner.drain().await.unwrap();

        let response = f.router.clone().oneshot(get("/v1/applications")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let listed = body.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["name"], "Demo");
        assert_eq!(listed[0]["token"], token.as_str());
        assert_eq!(listed[0]["chats_count"], 0);
        assert!(listed[0].get("id").is_none(), "internal id must not leak");
    }

    #[tokio::test]
    async fn create_application_without_name_is_422() {
        let f = setup().await;
        let response = f
            .router
            .clone()
            .oneshot(post_json("/v1/applications", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn create_chat_unknown_token_is_404() {
        let f = setup().await;
        let response = f
            .router
            .clone()
            .oneshot(post_json("/v1/applications/nope/chats", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Application not found");
    }

    #[tokio::test]
    async fn concurrent_chat_creates_get_distinct_numbers() {
        let f = setup().await;
        f.store.create_application("Demo", "tok-cc").await.unwrap();

        let (a, b) = tokio::join!(
            f.router
                .clone()
                .oneshot(post_json("/v1/applications/tok-cc/chats", serde_json::json!({}))),
            f.router
                .clone()
                .oneshot(post_json("/v1/applications/tok-cc/chats", serde_json::json!({}))),
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.status(), StatusCode::CREATED);
        assert_eq!(b.status(), StatusCode::CREATED);

        let mut numbers = vec![
            body_json(a).await["data"]["chat_number"].as_i64().unwrap(),
            body_json(b).await["data"]["chat_number"].as_i64().unwrap(),
        ];
        numbers.sort_unstable();
        assert_eq!(numbers, vec![1, 2]);

        // Both persist once the queue drains.
        f.runner.drain().await.unwrap();
        let response = f
            .router
            .clone()
            .oneshot(get("/v1/applications/tok-cc/chats"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_chat_list_returns_message_body() {
        let f = setup().await;
        f.store.create_application("Demo", "tok-empty").await.unwrap();

        let response = f
            .router
            .clone()
            .oneshot(get("/v1/applications/tok-empty/chats"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "No chats found");
    }

    #[tokio::test]
    async fn oversized_message_body_is_422_and_consumes_no_number() {
        let f = setup().await;
        let app = f.store.create_application("Demo", "tok-val").await.unwrap();
        f.store.create_chat(app.id, 1).await.unwrap();

        let oversized = "x".repeat(BODY_MAX_BYTES + 1);
        let response = f
            .router
            .clone()
            .oneshot(post_json(
                "/v1/applications/tok-val/chats/1/messages",
                serde_json::json!({ "body": oversized }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["status"], "error");

        // The rejected request must not have consumed a number: the next
        // valid message gets number 1.
        let response = f
            .router
            .clone()
            .oneshot(post_json(
                "/v1/applications/tok-val/chats/1/messages",
                serde_json::json!({ "body": "fits" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["data"]["message_number"], 1);
    }

    #[tokio::test]
    async fn message_create_unknown_chat_is_404() {
        let f = setup().await;
        f.store.create_application("Demo", "tok-m").await.unwrap();

        let response = f
            .router
            .clone()
            .oneshot(post_json(
                "/v1/applications/tok-m/chats/9/messages",
                serde_json::json!({ "body": "hello" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Application or Chat not found");
    }

    #[tokio::test]
    async fn message_list_is_paginated_by_twenty() {
        let f = setup().await;
        let app = f.store.create_application("Demo", "tok-page").await.unwrap();
        let chat = f.store.create_chat(app.id, 1).await.unwrap();
        for n in 1..=25 {
            f.store
                .create_message(chat.id, n, &format!("message {n}"))
                .await
                .unwrap();
        }

        let response = f
            .router
            .clone()
            .oneshot(get("/v1/applications/tok-page/chats/1/messages?page=2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 5);
        assert_eq!(body["data"][0]["number"], 21);
        assert_eq!(body["meta"]["total"], 25);
        assert_eq!(body["meta"]["current_page"], 2);
        assert_eq!(body["meta"]["last_page"], 2);
        assert_eq!(body["meta"]["per_page"], 20);
    }

    #[tokio::test]
    async fn message_round_trips_through_list_and_search() {
        let f = setup().await;
        f.store.create_application("Demo", "tok-rt").await.unwrap();

        // Create the chat and the message through the API, draining the
        // queue between the dependent writes.
        let response = f
            .router
            .clone()
            .oneshot(post_json("/v1/applications/tok-rt/chats", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        f.runner.drain().await.unwrap();

        let response = f
            .router
            .clone()
            .oneshot(post_json(
                "/v1/applications/tok-rt/chats/1/messages",
                serde_json::json!({ "body": "Hi there!" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        f.runner.drain().await.unwrap();

        let response = f
            .router
            .clone()
            .oneshot(get("/v1/applications/tok-rt/chats/1/messages"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"][0]["body"], "Hi there!");

        let response = f
            .router
            .clone()
            .oneshot(get("/v1/applications/tok-rt/chats/1/messages/search?query=hi"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let hits = body.as_array().unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["body"], "Hi there!");

        // Another application with matching text stays invisible.
        let response = f
            .router
            .clone()
            .oneshot(get("/v1/applications/other/chats/1/messages/search?query=hi"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_without_query_is_422() {
        let f = setup().await;
        let response = f
            .router
            .clone()
            .oneshot(get("/v1/applications/tok/chats/1/messages/search"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Validation failed");
    }
}
