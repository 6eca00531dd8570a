//! Unified error handling system
//!
//! Two families live here. [`AuthError`] is the authorization taxonomy that
//! crosses the wire between server and client. [`BoardError`] covers
//! everything else (configuration, I/O, serialization) and carries an
//! [`ErrorContext`] for debugging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type BoardResult<T> = Result<T, BoardError>;

/// Authorization and session failures returned by the server
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthError {
    #[error("User already exists")]
    DuplicateName,
    #[error("Invalid user name")]
    InvalidName,
    #[error("Unknown user")]
    UnknownUser,
    #[error("Invalid credential")]
    InvalidCredential,
    #[error("Invalid token")]
    Unauthenticated,
    #[error("Token expired")]
    SessionStale,
    #[error("Insufficient access rights")]
    Forbidden,
    #[error("User not found")]
    NotFound,
}

impl AuthError {
    pub const ALL: [AuthError; 8] = [
        AuthError::DuplicateName,
        AuthError::InvalidName,
        AuthError::UnknownUser,
        AuthError::InvalidCredential,
        AuthError::Unauthenticated,
        AuthError::SessionStale,
        AuthError::Forbidden,
        AuthError::NotFound,
    ];

    /// Stable wire code carried in [`ErrorBody::error`]
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::DuplicateName => "duplicate_name",
            AuthError::InvalidName => "invalid_name",
            AuthError::UnknownUser => "unknown_user",
            AuthError::InvalidCredential => "invalid_credential",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::SessionStale => "session_stale",
            AuthError::Forbidden => "forbidden",
            AuthError::NotFound => "not_found",
        }
    }

    /// Parse a wire code back into an error kind
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// HTTP status the kind maps to
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::DuplicateName | AuthError::InvalidName | AuthError::UnknownUser => 400,
            AuthError::InvalidCredential
            | AuthError::Unauthenticated
            | AuthError::SessionStale => 401,
            AuthError::Forbidden => 403,
            AuthError::NotFound => 404,
        }
    }

    /// Only a stale session may be silently refreshed and retried
    pub fn is_refreshable(&self) -> bool {
        matches!(self, AuthError::SessionStale)
    }
}

/// JSON body of every failure response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorBody {
    /// Wire code, see [`AuthError::code`]
    pub error: String,
    pub message: String,
}

impl From<AuthError> for ErrorBody {
    fn from(kind: AuthError) -> Self {
        Self {
            error: kind.code().to_string(),
            message: kind.to_string(),
        }
    }
}

impl ErrorBody {
    /// The error kind named by this body, if it is a known one
    pub fn kind(&self) -> Option<AuthError> {
        AuthError::from_code(&self.error)
    }
}

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Infrastructure errors outside the authorization taxonomy
#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BoardError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            BoardError::Config { context, .. } => Some(context),
            BoardError::Validation { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            BoardError::Validation { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Validation error"
                );
            }
            _ => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Error occurred"
                );
            }
        }
    }
}

/// Convenience macro for configuration errors
#[macro_export]
macro_rules! config_error {
    ($msg:expr, $operation:expr) => {
        $crate::BoardError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new("config")
                .with_operation($operation)
                .with_suggestion("Check your configuration file"),
        }
    };
    ($msg:expr, $operation:expr, $source:expr) => {
        $crate::BoardError::Config {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new("config").with_operation($operation),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for kind in AuthError::ALL {
            assert_eq!(AuthError::from_code(kind.code()), Some(kind));
        }
        assert_eq!(AuthError::from_code("teapot"), None);
    }

    #[test]
    fn test_stale_and_unauthenticated_share_status_but_not_code() {
        assert_eq!(AuthError::SessionStale.status_code(), 401);
        assert_eq!(AuthError::Unauthenticated.status_code(), 401);
        assert_ne!(
            AuthError::SessionStale.code(),
            AuthError::Unauthenticated.code()
        );
    }

    #[test]
    fn test_only_stale_is_refreshable() {
        let refreshable: Vec<_> = AuthError::ALL
            .into_iter()
            .filter(AuthError::is_refreshable)
            .collect();
        assert_eq!(refreshable, vec![AuthError::SessionStale]);
    }

    #[test]
    fn test_error_body() {
        let body = ErrorBody::from(AuthError::Forbidden);
        assert_eq!(body.error, "forbidden");
        assert_eq!(body.message, "Insufficient access rights");
        assert_eq!(body.kind(), Some(AuthError::Forbidden));
    }

    #[test]
    fn test_config_error_macro() {
        let error = config_error!("bad port", "validate");
        match &error {
            BoardError::Config { context, .. } => {
                assert_eq!(context.component, "config");
                assert_eq!(context.operation.as_deref(), Some("validate"));
                assert!(!context.error_id.is_empty());
            }
            _ => panic!("Expected Config error"),
        }
        error.log();
    }
}
