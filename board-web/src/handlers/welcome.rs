//! Greeting for signed-in users

use super::types::WelcomeResponse;
use crate::auth::SessionUser;
use axum::response::Json;
use board_core::ErrorBody;

/// Greet the caller by name
#[utoipa::path(
    get,
    path = "/api/welcome",
    tag = "Session",
    summary = "Welcome message",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Greeting", body = WelcomeResponse),
        (status = 401, description = "Unknown or stale credential", body = ErrorBody)
    )
)]
pub async fn welcome(SessionUser(user): SessionUser) -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: format!("Hello, {}", user.name),
    })
}
