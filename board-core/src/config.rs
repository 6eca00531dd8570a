//! Configuration management

use crate::config_error;
use crate::error::BoardResult;
use crate::logging::LoggingConfig;
use crate::types::DEFAULT_ADMIN_NAME;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top level configuration shared by the server and the client tools
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub logging: LoggingConfig,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Name that receives the admin role when it registers
    pub admin_name: String,
    /// Origins allowed by CORS
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3333,
            admin_name: DEFAULT_ADMIN_NAME.to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl ServerConfig {
    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the API, including the `/api` prefix
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Where the CLI keeps its credential slot; defaults to the user config dir
    pub credential_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3333/api".to_string(),
            timeout_seconds: 30,
            user_agent: "refresh-board/0.1".to_string(),
            credential_file: None,
        }
    }
}

impl BoardConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> BoardResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| config_error!(format!("Failed to read config file: {}", e), "read_file", e))?;

        let config: BoardConfig = toml::from_str(&content)
            .map_err(|e| config_error!(format!("Failed to parse config: {}", e), "parse_toml", e))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> BoardResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            config_error!(format!("Failed to serialize config: {}", e), "serialize_toml", e)
        })?;

        std::fs::write(path, content).map_err(|e| {
            config_error!(format!("Failed to write config file: {}", e), "write_file", e)
        })?;

        Ok(())
    }

    /// Apply `BOARD_*` environment variables on top of the loaded values
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("BOARD_HOST") {
            self.server.host = host;
        }
        if let Some(port) = std::env::var("BOARD_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            self.server.port = port;
        }
        if let Ok(admin_name) = std::env::var("BOARD_ADMIN_NAME") {
            self.server.admin_name = admin_name;
        }
        if let Ok(base_url) = std::env::var("BOARD_BASE_URL") {
            self.client.base_url = base_url;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> BoardResult<()> {
        if self.server.admin_name.trim().is_empty() {
            return Err(config_error!(
                "server.admin_name must not be empty",
                "validate"
            ));
        }

        if self.client.base_url.trim().is_empty() {
            return Err(config_error!("client.base_url must not be empty", "validate"));
        }

        if self.client.timeout_seconds == 0 {
            return Err(config_error!(
                "client.timeout_seconds must be greater than 0",
                "validate"
            ));
        }

        Ok(())
    }
}
