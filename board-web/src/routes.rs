//! Route definitions for the board server

use crate::{auth, handlers, openapi, AppState};
use axum::{
    routing::{get, post, put},
    Router,
};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Registration and user administration
        .route(
            "/users",
            post(auth::handlers::register_user).get(handlers::list_users),
        )
        .route("/users/{name}", put(handlers::update_role))
        // Sessions
        .route(
            "/sessions",
            post(auth::handlers::create_session).put(auth::handlers::refresh_session),
        )
        .route("/welcome", get(handlers::welcome))
        // Message board
        .route(
            "/messages",
            get(handlers::list_messages).post(handlers::post_message),
        )
        // API documentation
        .route("/openapi.json", get(openapi::openapi_json))
}
