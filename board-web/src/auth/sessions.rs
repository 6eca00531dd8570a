//! Session issuance
//!
//! A session is the user snapshot handed back to the client. Issuing one
//! always clears the user's refresh flag, so the snapshot is valid until an
//! admin changes the user again.

use super::directory::UserDirectory;
use board_core::{AuthError, User};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SessionIssuer {
    directory: UserDirectory,
}

impl SessionIssuer {
    pub fn new(directory: UserDirectory) -> Self {
        Self { directory }
    }

    /// Sign in by name
    pub async fn issue(&self, name: &str) -> Result<User, AuthError> {
        let user = self.directory.revalidate(name).await.ok_or_else(|| {
            debug!("Session refused for unknown user: {}", name);
            AuthError::UnknownUser
        })?;

        info!("Issued session for {}", user.name);
        Ok(user)
    }

    /// Re-validate the session named by the credential the client currently
    /// holds. Used by the client's refresh protocol.
    pub async fn reissue(&self, presented_name: Option<&str>) -> Result<User, AuthError> {
        let name = presented_name.ok_or(AuthError::InvalidCredential)?;

        let user = self.directory.revalidate(name).await.ok_or_else(|| {
            debug!("Refresh refused, credential names unknown user: {}", name);
            AuthError::InvalidCredential
        })?;

        info!("Reissued session for {}", user.name);
        Ok(user)
    }
}
