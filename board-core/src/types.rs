//! Core data type definitions

use crate::error::{BoardError, BoardResult, ErrorContext};
use serde::{Deserialize, Serialize};

/// Default name that is granted the admin role at registration
pub const DEFAULT_ADMIN_NAME: &str = "admin";

/// Authorization role of a user
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular user, the default for every registration
    #[default]
    User,
    /// May read the message board
    Superuser,
    /// May administer users
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Superuser => write!(f, "superuser"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "superuser" => Ok(Role::Superuser),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// A registered identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct User {
    /// Server generated, never reused
    pub id: String,
    /// Login key, unique and immutable
    pub name: String,
    pub role: Role,
    /// Set when an admin changed this user; every credential is stale until reissued
    pub must_refresh: bool,
}

impl User {
    /// Create a fresh user record with a new id
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            role,
            must_refresh: false,
        }
    }

    /// Check whether the user's role is one of `allowed`
    pub fn has_any_role(&self, allowed: &[Role]) -> bool {
        allowed.contains(&self.role)
    }
}

/// The identity a credential claims to carry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    pub name: String,
    #[serde(default)]
    pub role: Role,
}

/// Opaque client-held credential: the serialized user snapshot returned by
/// the session endpoints.
///
/// The credential is self-describing but not signed. The server trusts the
/// name inside it and re-checks the directory on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Snapshot a user into a credential
    pub fn from_user(user: &User) -> BoardResult<Self> {
        Ok(Self(serde_json::to_string(user)?))
    }

    /// Wrap a previously serialized credential, e.g. one read back from storage
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw serialized form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the identity carried by this credential
    pub fn claims(&self) -> BoardResult<CredentialClaims> {
        serde_json::from_str(&self.0).map_err(|e| BoardError::Validation {
            message: format!("Malformed credential: {}", e),
            field: Some("credential".to_string()),
            context: ErrorContext::new("credential").with_operation("decode"),
        })
    }

    /// Name carried by the credential, if it decodes
    pub fn name(&self) -> Option<String> {
        self.claims().ok().map(|claims| claims.name)
    }

    /// Value for the `Authorization` header
    pub fn authorization_header(&self) -> Option<String> {
        self.name().map(|name| format!("Bearer {}", name))
    }
}

/// A message posted to the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Message {
    pub id: String,
    pub sender: String,
    pub content: String,
}

impl Message {
    pub fn new(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender: sender.into(),
            content: content.into(),
        }
    }
}
