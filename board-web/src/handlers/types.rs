//! Request and response bodies

use board_core::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of the registration and sign-in requests
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NameRequest {
    #[schema(example = "alice")]
    pub name: String,
}

/// Role change request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// Greeting for the authenticated user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WelcomeResponse {
    #[schema(example = "Hello, alice")]
    pub message: String,
}

/// New message posted to the board
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostMessageRequest {
    #[schema(example = "hello everyone")]
    pub message: String,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[schema(example = "0.1.0")]
    pub version: String,
}
