//! Client-side error type

use board_core::AuthError;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

/// Everything a client call can fail with.
///
/// `Clone` so one refresh outcome can be handed to every request waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The server answered with a known authorization error
    #[error("Request rejected: {0}")]
    Rejected(AuthError),

    /// The server answered with a status outside the known taxonomy
    #[error("Unexpected response ({status}): {message}")]
    Unexpected { status: u16, message: String },

    /// The request never got an answer
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Credential storage error: {0}")]
    Storage(String),
}

impl From<AuthError> for ClientError {
    fn from(kind: AuthError) -> Self {
        ClientError::Rejected(kind)
    }
}

impl ClientError {
    /// Authorization error kind, if the server named one
    pub fn kind(&self) -> Option<AuthError> {
        match self {
            ClientError::Rejected(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Whether the failure should trigger a silent refresh-and-retry
    pub fn is_session_stale(&self) -> bool {
        self.kind().is_some_and(|kind| kind.is_refreshable())
    }

    /// Whether the user has to go back to the sign-in view
    pub fn requires_sign_in(&self) -> bool {
        matches!(
            self.kind(),
            Some(AuthError::Unauthenticated | AuthError::InvalidCredential)
        )
    }
}
