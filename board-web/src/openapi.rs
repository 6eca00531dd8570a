//! OpenAPI specification for the board server

use axum::response::Json;
use board_core::{ErrorBody, Message, Role, User};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use crate::handlers::{
    HealthResponse, NameRequest, PostMessageRequest, UpdateRoleRequest, WelcomeResponse,
};

/// Main OpenAPI specification
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Refresh Board API",
        version = "0.1.0",
        description = "Name-based sessions with admin-forced refresh, fronting a message board",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:3333", description = "Local development server")
    ),
    paths(
        crate::handlers::health_check,
        crate::auth::handlers::register_user,
        crate::auth::handlers::create_session,
        crate::auth::handlers::refresh_session,
        crate::handlers::welcome,
        crate::handlers::list_users,
        crate::handlers::update_role,
        crate::handlers::list_messages,
        crate::handlers::post_message,
    ),
    components(
        schemas(
            User,
            Role,
            Message,
            ErrorBody,
            HealthResponse,
            NameRequest,
            UpdateRoleRequest,
            WelcomeResponse,
            PostMessageRequest,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Session", description = "Registration, sign-in and refresh"),
        (name = "Users", description = "User administration"),
        (name = "Messages", description = "Message board"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Bearer credential scheme
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// Get the OpenAPI specification as JSON
pub fn get_openapi_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_pretty_json()
}

/// Serve the OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
