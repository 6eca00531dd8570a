//! Message board handlers

use super::types::PostMessageRequest;
use crate::{
    auth::{MessageReader, SessionUser},
    AppState,
};
use axum::{extract::State, http::StatusCode, response::Json, Json as JsonExtractor};
use board_core::{ErrorBody, Message};

/// List all messages
#[utoipa::path(
    get,
    path = "/api/messages",
    tag = "Messages",
    summary = "List messages",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All messages", body = [Message]),
        (status = 401, description = "Unknown or stale credential", body = ErrorBody),
        (status = 403, description = "Caller is neither admin nor superuser", body = ErrorBody)
    )
)]
pub async fn list_messages(
    State(state): State<AppState>,
    MessageReader(_reader): MessageReader,
) -> Json<Vec<Message>> {
    Json(state.messages.list().await)
}

/// Post a message as the caller
#[utoipa::path(
    post,
    path = "/api/messages",
    tag = "Messages",
    summary = "Post a message",
    security(("bearer" = [])),
    request_body = PostMessageRequest,
    responses(
        (status = 201, description = "Message created", body = Message),
        (status = 401, description = "Unknown or stale credential", body = ErrorBody)
    )
)]
pub async fn post_message(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    JsonExtractor(request): JsonExtractor<PostMessageRequest>,
) -> (StatusCode, Json<Message>) {
    let message = state.messages.post(&user.name, &request.message).await;
    (StatusCode::CREATED, Json(message))
}
