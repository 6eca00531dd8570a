//! Application state shared by all handlers

use crate::{
    auth::{directory::UserDirectory, sessions::SessionIssuer},
    messages::MessageBoard,
    WebConfig,
};
use tracing::info;

/// Owned, cheaply clonable handles to the server's shared state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: WebConfig,
    /// Identity, role and session validity
    pub directory: UserDirectory,
    /// Turns names into sessions
    pub sessions: SessionIssuer,
    /// Message storage
    pub messages: MessageBoard,
}

impl AppState {
    /// Create a new application state with an empty directory
    pub fn new(config: WebConfig) -> Self {
        let directory = UserDirectory::new(config.admin_name.clone());
        let sessions = SessionIssuer::new(directory.clone());

        info!(
            "Application state initialized (reserved admin name: {})",
            config.admin_name
        );

        Self {
            config,
            directory,
            sessions,
            messages: MessageBoard::new(),
        }
    }
}
