//! User directory: the single source of truth for identity, role and
//! session validity.

use board_core::{AuthError, Role, User};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// In-memory user directory guarded by one lock.
///
/// Every mutation takes the write lock for its whole check-then-act
/// sequence, so names stay unique and role updates are never lost. Readers
/// only ever see complete records.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    users: Arc<RwLock<Vec<User>>>,
    admin_name: Arc<str>,
}

impl UserDirectory {
    /// Create an empty directory; `admin_name` registers as an admin
    pub fn new(admin_name: impl Into<String>) -> Self {
        Self {
            users: Arc::new(RwLock::new(Vec::new())),
            admin_name: Arc::from(admin_name.into()),
        }
    }

    /// Register a new user.
    ///
    /// The caller authenticates separately through the session issuer.
    pub async fn register(&self, name: &str) -> Result<User, AuthError> {
        if !is_valid_name(name) {
            debug!("Registration failed: name {:?} is not usable as a credential", name);
            return Err(AuthError::InvalidName);
        }

        let mut users = self.users.write().await;

        if users.iter().any(|user| user.name == name) {
            debug!("Registration failed: name '{}' already exists", name);
            return Err(AuthError::DuplicateName);
        }

        let role = if name == &*self.admin_name {
            Role::Admin
        } else {
            Role::User
        };

        let user = User::new(name, role);
        users.push(user.clone());

        info!("Registered new user: {} ({})", user.name, user.role);
        Ok(user)
    }

    /// Exact, case-sensitive lookup
    pub async fn find_by_name(&self, name: &str) -> Option<User> {
        let users = self.users.read().await;
        users.iter().find(|user| user.name == name).cloned()
    }

    /// Change a user's role and force them to re-authenticate.
    ///
    /// Only an admin actor may do this.
    pub async fn set_role(
        &self,
        actor_role: Role,
        target_name: &str,
        new_role: Role,
    ) -> Result<User, AuthError> {
        if actor_role != Role::Admin {
            warn!(
                "Role change for '{}' refused: actor role is {}",
                target_name, actor_role
            );
            return Err(AuthError::Forbidden);
        }

        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|user| user.name == target_name)
            .ok_or(AuthError::NotFound)?;

        user.role = new_role;
        user.must_refresh = true;

        info!(
            "Role of '{}' set to {}, session marked for refresh",
            user.name, new_role
        );
        Ok(user.clone())
    }

    /// Clear the refresh flag and return the current record
    pub(crate) async fn revalidate(&self, name: &str) -> Option<User> {
        let mut users = self.users.write().await;
        let user = users.iter_mut().find(|user| user.name == name)?;
        user.must_refresh = false;
        Some(user.clone())
    }

    /// All users in registration order
    pub async fn list(&self) -> Vec<User> {
        self.users.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

/// A name must survive the trip through an `Authorization` header unchanged:
/// non-empty, no surrounding whitespace, no control characters.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.trim() == name && !name.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_assigns_roles() {
        let directory = UserDirectory::new("admin");

        let admin = directory.register("admin").await.unwrap();
        let alice = directory.register("alice").await.unwrap();

        assert_eq!(admin.role, Role::Admin);
        assert_eq!(alice.role, Role::User);
        assert!(!alice.must_refresh);
        assert_ne!(admin.id, alice.id);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let directory = UserDirectory::new("admin");
        directory.register("alice").await.unwrap();

        let result = directory.register("alice").await;

        assert_eq!(result, Err(AuthError::DuplicateName));
        assert_eq!(directory.len().await, 1);
    }

    #[tokio::test]
    async fn test_unusable_names_are_rejected() {
        let directory = UserDirectory::new("admin");

        for name in ["", " ", " carol", "carol ", "car\nol"] {
            assert_eq!(directory.register(name).await, Err(AuthError::InvalidName), "{:?}", name);
        }
        assert_eq!(directory.len().await, 0);

        let jose = directory.register("José").await.unwrap();
        assert_eq!(jose.name, "José");
        assert!(directory.register("bob?x/y").await.is_ok());
    }

    #[tokio::test]
    async fn test_lookup_is_case_sensitive() {
        let directory = UserDirectory::new("admin");
        directory.register("alice").await.unwrap();

        assert!(directory.find_by_name("alice").await.is_some());
        assert!(directory.find_by_name("Alice").await.is_none());
    }

    #[tokio::test]
    async fn test_reserved_name_is_configurable() {
        let directory = UserDirectory::new("root");

        assert_eq!(directory.register("admin").await.unwrap().role, Role::User);
        assert_eq!(directory.register("root").await.unwrap().role, Role::Admin);
    }

    #[tokio::test]
    async fn test_set_role_by_non_admin_never_mutates() {
        let directory = UserDirectory::new("admin");
        let before = directory.register("alice").await.unwrap();

        for actor in [Role::User, Role::Superuser] {
            let result = directory.set_role(actor, "alice", Role::Admin).await;
            assert_eq!(result, Err(AuthError::Forbidden));
        }

        assert_eq!(directory.find_by_name("alice").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_set_role_flags_refresh() {
        let directory = UserDirectory::new("admin");
        directory.register("alice").await.unwrap();

        let updated = directory
            .set_role(Role::Admin, "alice", Role::Superuser)
            .await
            .unwrap();

        assert_eq!(updated.role, Role::Superuser);
        assert!(updated.must_refresh);
        assert!(directory.find_by_name("alice").await.unwrap().must_refresh);
    }

    #[tokio::test]
    async fn test_set_role_unknown_target() {
        let directory = UserDirectory::new("admin");
        let result = directory.set_role(Role::Admin, "ghost", Role::User).await;
        assert_eq!(result, Err(AuthError::NotFound));
    }

    #[tokio::test]
    async fn test_concurrent_registration_keeps_names_unique() {
        let directory = UserDirectory::new("admin");

        let attempts: Vec<_> = (0..16)
            .map(|_| {
                let directory = directory.clone();
                tokio::spawn(async move { directory.register("carol").await })
            })
            .collect();

        let mut successes = 0;
        for attempt in attempts {
            if attempt.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(directory.len().await, 1);
    }

    #[tokio::test]
    async fn test_list_preserves_registration_order() {
        let directory = UserDirectory::new("admin");
        for name in ["zed", "amy", "admin"] {
            directory.register(name).await.unwrap();
        }

        let names: Vec<_> = directory.list().await.into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["zed", "amy", "admin"]);
    }
}
