//! Board Web Server
//!
//! Main web server implementation using Axum.

use crate::{create_app, AppState, WebConfig, WebError, WebResult};
use axum::serve;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Main board web server
pub struct BoardServer {
    config: WebConfig,
    state: AppState,
}

impl BoardServer {
    /// Create a new server with an empty directory
    pub fn new(config: WebConfig) -> Self {
        let state = AppState::new(config.clone());
        Self { config, state }
    }

    /// Start the web server and run until Ctrl-C
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();

        info!("Starting board server");
        info!("Reserved admin name: {}", self.config.admin_name);

        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);

        if let Err(e) = serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
        {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        info!("Server shut down gracefully");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &WebConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Builder for BoardServer
pub struct BoardServerBuilder {
    config: WebConfig,
}

impl BoardServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self {
            config: WebConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn with_config(config: WebConfig) -> Self {
        Self { config }
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the reserved administrator name
    pub fn admin_name<S: Into<String>>(mut self, admin_name: S) -> Self {
        self.config.admin_name = admin_name.into();
        self
    }

    /// Build the server
    pub fn build(self) -> WebResult<BoardServer> {
        if self.config.admin_name.trim().is_empty() {
            return Err(WebError::Config(
                "Admin name must not be empty".to_string(),
            ));
        }
        Ok(BoardServer::new(self.config))
    }
}

impl Default for BoardServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
