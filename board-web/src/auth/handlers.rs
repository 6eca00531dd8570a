//! Registration and session endpoints
//!
//! None of these sit behind the session extractor: registration and sign-in
//! have no credential yet, and a refresh must work precisely when the
//! current credential is stale.

use super::{extract_credential_name, AuthRejection};
use crate::{handlers::NameRequest, AppState};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    Json as JsonExtractor,
};
use board_core::{ErrorBody, User};
use tracing::info;

/// User registration endpoint
///
/// Creates the user and answers with an empty body; the client signs in
/// with a separate call.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Session",
    summary = "Register",
    request_body = NameRequest,
    responses(
        (status = 201, description = "User created"),
        (status = 400, description = "Name already taken or not usable", body = ErrorBody)
    )
)]
pub async fn register_user(
    State(app_state): State<AppState>,
    JsonExtractor(request): JsonExtractor<NameRequest>,
) -> Result<StatusCode, AuthRejection> {
    info!("User registration attempt: {}", request.name);

    app_state.directory.register(&request.name).await?;

    Ok(StatusCode::CREATED)
}

/// Sign-in endpoint
///
/// Returns the user snapshot that the client keeps as its credential.
#[utoipa::path(
    post,
    path = "/api/sessions",
    tag = "Session",
    summary = "Sign in",
    request_body = NameRequest,
    responses(
        (status = 200, description = "Session issued", body = User),
        (status = 400, description = "Unknown user", body = ErrorBody)
    )
)]
pub async fn create_session(
    State(app_state): State<AppState>,
    JsonExtractor(request): JsonExtractor<NameRequest>,
) -> Result<Json<User>, AuthRejection> {
    info!("Sign-in attempt: {}", request.name);

    let user = app_state.sessions.issue(&request.name).await?;

    Ok(Json(user))
}

/// Session refresh endpoint
///
/// Reissues the session named by the presented credential, stale or not.
#[utoipa::path(
    put,
    path = "/api/sessions",
    tag = "Session",
    summary = "Refresh session",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Session reissued", body = User),
        (status = 401, description = "Credential names no known user", body = ErrorBody)
    )
)]
pub async fn refresh_session(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<User>, AuthRejection> {
    let presented = extract_credential_name(&headers);

    let user = app_state.sessions.reissue(presented.as_deref()).await?;

    Ok(Json(user))
}
