//! Board Client - talks to the board server and keeps its session fresh
//!
//! The client holds one credential, attaches it to every protected call and
//! recovers from admin-forced session invalidation without surfacing it to
//! the caller: a stale answer triggers one shared reissue, after which every
//! affected call is replayed once.

pub mod client;
pub mod error;
pub mod refresh;
pub mod store;
pub mod transport;

pub use client::{needs_sign_in, BoardClient};
pub use error::{ClientError, ClientResult};
pub use refresh::RefreshCoordinator;
pub use store::{
    CredentialSnapshot, CredentialStore, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore,
    CREDENTIAL_KEY,
};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport, TransportConfig};
