//! User administration handlers

use super::types::UpdateRoleRequest;
use crate::{
    auth::{AdminUser, AuthRejection},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::Json,
    Json as JsonExtractor,
};
use board_core::{ErrorBody, User};
use tracing::info;

/// List every registered user
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    summary = "List users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All users in registration order", body = [User]),
        (status = 401, description = "Unknown or stale credential", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Json<Vec<User>> {
    info!("Listing users for {}", admin.name);
    Json(state.directory.list().await)
}

/// Change a user's role. The target must sign in again afterwards.
#[utoipa::path(
    put,
    path = "/api/users/{name}",
    tag = "Users",
    summary = "Set a user's role",
    security(("bearer" = [])),
    params(("name" = String, Path, description = "Name of the user to update")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 401, description = "Unknown or stale credential", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody),
        (status = 404, description = "No such user", body = ErrorBody)
    )
)]
pub async fn update_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(name): Path<String>,
    JsonExtractor(request): JsonExtractor<UpdateRoleRequest>,
) -> Result<Json<User>, AuthRejection> {
    info!("{} sets role of {} to {}", admin.name, name, request.role);

    let user = state
        .directory
        .set_role(admin.role, &name, request.role)
        .await?;

    Ok(Json(user))
}
