//! Authentication and authorization using Axum extractors
//!
//! [`SessionUser`] is the authorization middleware: every protected handler
//! takes it (directly or through a role gate) and it runs before the handler
//! body. It resolves the bearer credential against the directory and rejects
//! unknown identities and stale sessions with distinct error codes.

pub mod directory;
pub mod handlers;
pub mod sessions;


use crate::AppState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use board_core::{AuthError, ErrorBody, Role, User};
use directory::UserDirectory;
use tracing::{debug, warn};

/// Roles allowed to administer users
pub const ADMIN_ROLES: &[Role] = &[Role::Admin];

/// Roles allowed to read the message board
pub const MESSAGE_READER_ROLES: &[Role] = &[Role::Admin, Role::Superuser];

/// HTTP rejection carrying an [`AuthError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthRejection(pub AuthError);

impl From<AuthError> for AuthRejection {
    fn from(kind: AuthError) -> Self {
        Self(kind)
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(ErrorBody::from(self.0))).into_response()
    }
}

/// Extract the name carried by the `Authorization` header.
///
/// Accepts `Bearer <name>` as well as a bare `<name>`. The value is decoded
/// as UTF-8 and taken verbatim after the prefix; lookups stay exact.
pub fn extract_credential_name(headers: &HeaderMap) -> Option<String> {
    let value = std::str::from_utf8(headers.get(AUTHORIZATION)?.as_bytes()).ok()?;
    let name = value.strip_prefix("Bearer ").unwrap_or(value);

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Resolve the request's credential to a user with a valid session
pub async fn authenticate(
    directory: &UserDirectory,
    headers: &HeaderMap,
) -> Result<User, AuthError> {
    let name = extract_credential_name(headers).ok_or_else(|| {
        debug!("Missing or empty Authorization header");
        AuthError::Unauthenticated
    })?;

    let user = directory.find_by_name(&name).await.ok_or_else(|| {
        debug!("Credential names unknown user: {}", name);
        AuthError::Unauthenticated
    })?;

    if user.must_refresh {
        debug!("Session of '{}' is stale", user.name);
        return Err(AuthError::SessionStale);
    }

    Ok(user)
}

/// Check the caller's role against a route's allowed set
pub fn require_role(user: &User, allowed: &[Role]) -> Result<(), AuthError> {
    if user.has_any_role(allowed) {
        Ok(())
    } else {
        warn!(
            "User '{}' with role {} denied, requires one of {:?}",
            user.name, user.role, allowed
        );
        Err(AuthError::Forbidden)
    }
}

/// Authenticated user with a valid session
#[derive(Debug, Clone)]
pub struct SessionUser(pub User);

impl<S> FromRequestParts<S> for SessionUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<User>() {
            return Ok(SessionUser(user.clone()));
        }

        let app_state = AppState::from_ref(state);
        let user = authenticate(&app_state.directory, &parts.headers).await?;

        parts.extensions.insert(user.clone());
        Ok(SessionUser(user))
    }
}

/// Admin user extractor - requires the admin role
pub struct AdminUser(pub User);

impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let SessionUser(user) = SessionUser::from_request_parts(parts, state).await?;
        require_role(&user, ADMIN_ROLES)?;
        Ok(AdminUser(user))
    }
}

/// Message reader extractor - requires admin or superuser
pub struct MessageReader(pub User);

impl<S> FromRequestParts<S> for MessageReader
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let SessionUser(user) = SessionUser::from_request_parts(parts, state).await?;
        require_role(&user, MESSAGE_READER_ROLES)?;
        Ok(MessageReader(user))
    }
}
