//! Board API client
//!
//! Every protected call goes through [`BoardClient::execute`], which attaches
//! the current credential at send time and, on a stale-session answer,
//! refreshes through the [`RefreshCoordinator`] and replays the call once.

use board_core::{ClientConfig, Credential, CredentialClaims, Message, Role, User};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::ClientResult;
use crate::refresh::{RefreshCoordinator, REISSUE_PATH};
use crate::store::{CredentialStore, KeyValueStore};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Transport, TransportConfig};

#[derive(Debug, Deserialize)]
struct WelcomeResponse {
    message: String,
}

/// High-level client for the board API
pub struct BoardClient {
    transport: Arc<dyn Transport>,
    store: Arc<CredentialStore>,
    refresh: RefreshCoordinator,
}

impl BoardClient {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<CredentialStore>) -> Self {
        let refresh = RefreshCoordinator::new(transport.clone(), store.clone());
        Self {
            transport,
            store,
            refresh,
        }
    }

    /// HTTP client using the given persistence backend
    pub fn http(config: &ClientConfig, backend: Arc<dyn KeyValueStore>) -> ClientResult<Self> {
        let transport = HttpTransport::new(TransportConfig::from(config))?;
        let store = CredentialStore::new(backend)?;
        Ok(Self::new(Arc::new(transport), Arc::new(store)))
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.store
    }

    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.refresh
    }

    /// Send a request with the current credential, refreshing and replaying
    /// once if the session turned out to be stale
    pub async fn execute(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let snapshot = self.store.snapshot();
        let first = self
            .send(request.clone().with_credential(snapshot.credential.as_ref()))
            .await;

        match first {
            Err(error) if error.is_session_stale() && request.refreshable => {
                let credential = self.refresh.refresh(snapshot.generation).await?;
                debug!("Replaying {} {}", request.method, request.path);
                self.send(request.with_credential(Some(&credential))).await
            }
            other => other,
        }
    }

    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        self.transport.send(request).await?.into_result()
    }

    /// Register a new name
    pub async fn register(&self, name: &str) -> ClientResult<()> {
        let request = ApiRequest::post("/users", json!({ "name": name })).without_refresh();
        self.send(request).await?;
        info!("Registered {}", name);
        Ok(())
    }

    /// Sign in and keep the issued credential
    pub async fn sign_in(&self, name: &str) -> ClientResult<User> {
        let request = ApiRequest::post(REISSUE_PATH, json!({ "name": name })).without_refresh();
        let response = self.send(request).await?;

        let user: User = response.json()?;
        self.store.set(Credential::from_raw(response.body))?;
        info!("Signed in as {} ({})", user.name, user.role);
        Ok(user)
    }

    /// Drop the stored credential
    pub fn sign_out(&self) -> ClientResult<()> {
        self.store.clear()
    }

    /// Identity of the signed-in user, read from the stored credential
    pub fn current_user(&self) -> Option<CredentialClaims> {
        self.store.claims()
    }

    pub async fn welcome(&self) -> ClientResult<String> {
        let response = self.execute(ApiRequest::get("/welcome")).await?;
        Ok(response.json::<WelcomeResponse>()?.message)
    }

    pub async fn list_users(&self) -> ClientResult<Vec<User>> {
        self.execute(ApiRequest::get("/users")).await?.json()
    }

    /// Change a user's role; admin only
    pub async fn set_role(&self, name: &str, role: Role) -> ClientResult<User> {
        let path = format!("/users/{}", urlencoding::encode(name));
        let request = ApiRequest::put(path).with_body(json!({ "role": role }));
        self.execute(request).await?.json()
    }

    pub async fn list_messages(&self) -> ClientResult<Vec<Message>> {
        self.execute(ApiRequest::get("/messages")).await?.json()
    }

    pub async fn post_message(&self, content: &str) -> ClientResult<Message> {
        let request = ApiRequest::post("/messages", json!({ "message": content }));
        self.execute(request).await?.json()
    }
}

impl std::fmt::Debug for BoardClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardClient")
            .field("signed_in_as", &self.current_user().map(|claims| claims.name))
            .finish()
    }
}

/// Convenience for callers that only care whether the user must sign in again
pub fn needs_sign_in(result: &ClientResult<impl Sized>) -> bool {
    matches!(result, Err(error) if error.requires_sign_in())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use async_trait::async_trait;
    use board_core::{AuthError, ErrorBody};
    use reqwest::Method;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// In-process stand-in for the server with just enough behavior to
    /// exercise stale sessions
    struct FakeBoard {
        roles: Mutex<HashMap<String, Role>>,
        stale: AtomicBool,
        reject_reissue: AtomicBool,
        stale_answers: AtomicUsize,
        reissues: AtomicUsize,
        gate_reissue: AtomicBool,
        release: Notify,
        posted: Mutex<Vec<String>>,
        paths: Mutex<Vec<String>>,
    }

    impl FakeBoard {
        fn new() -> Arc<Self> {
            let mut roles = HashMap::new();
            roles.insert("alice".to_string(), Role::User);
            roles.insert("root".to_string(), Role::Admin);
            Arc::new(Self {
                roles: Mutex::new(roles),
                stale: AtomicBool::new(false),
                reject_reissue: AtomicBool::new(false),
                stale_answers: AtomicUsize::new(0),
                reissues: AtomicUsize::new(0),
                gate_reissue: AtomicBool::new(false),
                release: Notify::new(),
                posted: Mutex::new(Vec::new()),
                paths: Mutex::new(Vec::new()),
            })
        }

        fn user(&self, name: &str) -> Option<User> {
            let roles = self.roles.lock().unwrap();
            roles.get(name).map(|role| User::new(name, *role))
        }

        fn error(kind: AuthError) -> ClientResult<ApiResponse> {
            Ok(ApiResponse::new(
                kind.status_code(),
                serde_json::to_string(&ErrorBody::from(kind)).unwrap(),
            ))
        }

        fn ok<T: serde::Serialize>(status: u16, body: &T) -> ClientResult<ApiResponse> {
            Ok(ApiResponse::new(status, serde_json::to_string(body).unwrap()))
        }

        fn caller(request: &ApiRequest) -> Option<String> {
            request
                .authorization
                .as_deref()
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::to_string)
        }
    }

    #[async_trait]
    impl Transport for FakeBoard {
        async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
            tokio::task::yield_now().await;
            self.paths.lock().unwrap().push(request.path.clone());

            match (request.method.clone(), request.path.as_str()) {
                (Method::POST, "/sessions") => {
                    let name = request.body.as_ref().unwrap()["name"].as_str().unwrap().to_string();
                    match self.user(&name) {
                        Some(user) => Self::ok(200, &user),
                        None => Self::error(AuthError::UnknownUser),
                    }
                }
                (Method::PUT, "/sessions") => {
                    self.reissues.fetch_add(1, Ordering::SeqCst);
                    if self.gate_reissue.load(Ordering::SeqCst) {
                        self.release.notified().await;
                    }
                    if self.reject_reissue.load(Ordering::SeqCst) {
                        return Self::error(AuthError::InvalidCredential);
                    }
                    let user = Self::caller(&request).and_then(|name| self.user(&name));
                    match user {
                        Some(user) => {
                            self.stale.store(false, Ordering::SeqCst);
                            Self::ok(200, &user)
                        }
                        None => Self::error(AuthError::InvalidCredential),
                    }
                }
                (method, path) => {
                    let Some(user) = Self::caller(&request).and_then(|name| self.user(&name)) else {
                        return Self::error(AuthError::Unauthenticated);
                    };
                    if self.stale.load(Ordering::SeqCst) {
                        self.stale_answers.fetch_add(1, Ordering::SeqCst);
                        return Self::error(AuthError::SessionStale);
                    }
                    match (method, path) {
                        (Method::GET, "/welcome") => Self::ok(
                            200,
                            &json!({ "message": format!("Hello, {}", user.name) }),
                        ),
                        (Method::GET, "/users") if user.role != Role::Admin => {
                            Self::error(AuthError::Forbidden)
                        }
                        (Method::PUT, path) if path.starts_with("/users/") => {
                            let target = urlencoding::decode(&path["/users/".len()..])
                                .unwrap()
                                .into_owned();
                            let role: Role = serde_json::from_value(
                                request.body.as_ref().unwrap()["role"].clone(),
                            )
                            .unwrap();
                            let mut roles = self.roles.lock().unwrap();
                            match roles.get_mut(&target) {
                                Some(current) => {
                                    *current = role;
                                    let mut updated = User::new(target, role);
                                    updated.must_refresh = true;
                                    Self::ok(200, &updated)
                                }
                                None => Self::error(AuthError::NotFound),
                            }
                        }
                        (Method::POST, "/messages") => {
                            let content = request.body.as_ref().unwrap()["message"]
                                .as_str()
                                .unwrap()
                                .to_string();
                            self.posted.lock().unwrap().push(content.clone());
                            Self::ok(201, &Message::new(user.name, content))
                        }
                        _ => Ok(ApiResponse::new(404, "")),
                    }
                }
            }
        }
    }

    async fn signed_in_client(board: &Arc<FakeBoard>, name: &str) -> BoardClient {
        let client = BoardClient::new(board.clone(), Arc::new(CredentialStore::in_memory()));
        client.sign_in(name).await.unwrap();
        client
    }

    #[tokio::test]
    async fn test_sign_in_stores_credential() {
        let board = FakeBoard::new();
        let client = signed_in_client(&board, "alice").await;

        assert_eq!(client.current_user().unwrap().name, "alice");
        assert_eq!(client.welcome().await.unwrap(), "Hello, alice");

        client.sign_out().unwrap();
        assert!(client.current_user().is_none());
        let result = client.welcome().await;
        assert!(needs_sign_in(&result));
    }

    #[tokio::test]
    async fn test_sign_in_unknown_name_keeps_store_empty() {
        let board = FakeBoard::new();
        let client = BoardClient::new(board.clone(), Arc::new(CredentialStore::in_memory()));

        let result = client.sign_in("nobody").await;
        assert_eq!(result.unwrap_err(), ClientError::Rejected(AuthError::UnknownUser));
        assert!(client.current_user().is_none());
    }

    #[tokio::test]
    async fn test_stale_session_is_refreshed_and_replayed() {
        let board = FakeBoard::new();
        let client = signed_in_client(&board, "alice").await;
        board.stale.store(true, Ordering::SeqCst);

        let message = client.post_message("hi").await.unwrap();
        assert_eq!(message.sender, "alice");
        assert_eq!(board.reissues.load(Ordering::SeqCst), 1);
        assert_eq!(board.posted.lock().unwrap().as_slice(), ["hi".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_stale_requests_reissue_once() {
        let board = FakeBoard::new();
        let client = signed_in_client(&board, "alice").await;
        board.stale.store(true, Ordering::SeqCst);
        board.gate_reissue.store(true, Ordering::SeqCst);

        let calls = futures::future::join_all((0..5).map(|_| client.welcome()));
        let release = async {
            while board.stale_answers.load(Ordering::SeqCst) < 5 {
                tokio::task::yield_now().await;
            }
            board.release.notify_one();
        };
        let (results, _) = tokio::join!(calls, release);

        assert_eq!(board.reissues.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result.unwrap(), "Hello, alice");
        }
    }

    #[tokio::test]
    async fn test_failed_reissue_fails_all_waiters_alike() {
        let board = FakeBoard::new();
        let client = signed_in_client(&board, "alice").await;
        board.stale.store(true, Ordering::SeqCst);
        board.reject_reissue.store(true, Ordering::SeqCst);
        board.gate_reissue.store(true, Ordering::SeqCst);

        let calls = futures::future::join_all((0..4).map(|_| client.welcome()));
        let release = async {
            while board.stale_answers.load(Ordering::SeqCst) < 4 {
                tokio::task::yield_now().await;
            }
            board.release.notify_one();
        };
        let (results, _) = tokio::join!(calls, release);

        assert_eq!(board.reissues.load(Ordering::SeqCst), 1);
        for result in &results {
            assert_eq!(
                result.as_ref().unwrap_err(),
                &ClientError::Rejected(AuthError::Unauthenticated)
            );
            assert!(needs_sign_in(result));
        }
        assert!(client.current_user().is_none());
    }

    #[tokio::test]
    async fn test_set_role_encodes_target_name() {
        let board = FakeBoard::new();
        board
            .roles
            .lock()
            .unwrap()
            .insert("bob?x/y".to_string(), Role::User);
        let client = signed_in_client(&board, "root").await;

        let updated = client.set_role("bob?x/y", Role::Superuser).await.unwrap();

        assert_eq!(updated.name, "bob?x/y");
        assert_eq!(updated.role, Role::Superuser);
        assert_eq!(
            board.paths.lock().unwrap().last().map(String::as_str),
            Some("/users/bob%3Fx%2Fy")
        );
    }

    #[tokio::test]
    async fn test_forbidden_is_not_refreshed() {
        let board = FakeBoard::new();
        let client = signed_in_client(&board, "alice").await;

        let result = client.list_users().await;
        assert_eq!(result.unwrap_err(), ClientError::Rejected(AuthError::Forbidden));
        assert_eq!(board.reissues.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_replay_happens_only_once() {
        /// Always answers stale, even right after a successful reissue
        struct AlwaysStale {
            reissues: AtomicUsize,
            requests: AtomicUsize,
        }

        #[async_trait]
        impl Transport for AlwaysStale {
            async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
                if request.method == Method::PUT && request.path == REISSUE_PATH {
                    self.reissues.fetch_add(1, Ordering::SeqCst);
                    return FakeBoard::ok(200, &User::new("alice", Role::User));
                }
                self.requests.fetch_add(1, Ordering::SeqCst);
                FakeBoard::error(AuthError::SessionStale)
            }
        }

        let transport = Arc::new(AlwaysStale {
            reissues: AtomicUsize::new(0),
            requests: AtomicUsize::new(0),
        });
        let store = Arc::new(CredentialStore::in_memory());
        store
            .set(Credential::from_user(&User::new("alice", Role::User)).unwrap())
            .unwrap();
        let client = BoardClient::new(transport.clone(), store);

        let result = client.welcome().await;
        assert_eq!(result.unwrap_err(), ClientError::Rejected(AuthError::SessionStale));
        assert_eq!(transport.reissues.load(Ordering::SeqCst), 1);
        assert_eq!(transport.requests.load(Ordering::SeqCst), 2);
    }
}
