//! REST API endpoint handlers.
//!
//! Two routes: `GET /api/personas` and `POST /api/chat`. Any other method on
//! either path gets a 405 with an `Allow` header naming the supported one.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use persona_relay::ChatError;
use persona_relay::chat::{ChatReply, ChatRequest, ChatService};
use persona_relay::persona::PersonaSummary;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{ApiError, ErrorBody};

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ChatService>,
}

/// GET /api/personas: `[{id, name}]` in registry order.
pub async fn list_personas(State(app): State<AppState>) -> Json<Vec<PersonaSummary>> {
    Json(app.service.personas().list())
}

/// POST /api/chat: reply to one message as a persona.
///
/// Returns 200 `{reply}`, 400 `{error}` for malformed or incomplete
/// requests, and 500 for internal failures. The reply runs on its own task
/// so a panic inside it surfaces as a `JoinError` rather than a dropped
/// connection. If the client disconnects axum drops this future, and the
/// drop guard cancels the task's pending model call.
pub async fn post_chat(
    State(app): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        debug!("Rejected chat body: {}", rejection.body_text());
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let service = app.service.clone();
    let task_cancel = cancel.clone();
    let reply = tokio::spawn(async move { service.reply(request, &task_cancel).await })
        .await
        .map_err(|e| ChatError::Internal(format!("reply task failed: {e}")))??;
    debug!("Chat reply source={:?}", reply.source);
    Ok(Json(reply))
}

fn method_not_allowed(allow: &'static str) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, allow)],
        Json(ErrorBody::new("Method not allowed")),
    )
        .into_response()
}

/// Fallback for `/api/personas`.
pub async fn personas_method_not_allowed() -> Response {
    method_not_allowed("GET")
}

/// Fallback for `/api/chat`.
pub async fn chat_method_not_allowed() -> Response {
    method_not_allowed("POST")
}
