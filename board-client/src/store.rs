//! Credential persistence
//!
//! The credential lives in a single key-value slot so it survives restarts.
//! [`CredentialStore`] keeps an in-memory copy and a generation counter that
//! bumps on every write; the refresh coordinator uses the counter to tell
//! whether someone else already replaced the credential.

use board_core::{Credential, CredentialClaims};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock, RwLockWriteGuard};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

/// Slot the credential is stored under
pub const CREDENTIAL_KEY: &str = "refresh-board:credential";

/// Minimal persistent key-value storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> ClientResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> ClientResult<()>;
    fn remove(&self, key: &str) -> ClientResult<()>;
}

/// Process-local storage, lost on exit
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let entries = self.entries.lock().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten whole on every change
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `<config dir>/refresh-board/credentials.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("refresh-board").join("credentials.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> ClientResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            ClientError::Storage(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            ClientError::Storage(format!("Corrupt store {}: {}", self.path.display(), e))
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ClientError::Storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| ClientError::Storage(format!("Failed to encode store: {}", e)))?;
        std::fs::write(&self.path, content).map_err(|e| {
            ClientError::Storage(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let _guard = self.write_lock.lock().map_err(poisoned)?;
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        let _guard = self.write_lock.lock().map_err(poisoned)?;
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> ClientError {
    ClientError::Storage("Store lock poisoned".to_string())
}

/// Credential as seen at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSnapshot {
    /// Bumped on every set or clear
    pub generation: u64,
    pub credential: Option<Credential>,
}

#[derive(Debug, Default)]
struct CredentialState {
    generation: u64,
    credential: Option<Credential>,
}

/// The one credential slot the client works from
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
    state: RwLock<CredentialState>,
}

impl CredentialStore {
    /// Open the store, loading any credential persisted by a previous run
    pub fn new(backend: Arc<dyn KeyValueStore>) -> ClientResult<Self> {
        let credential = backend.get(CREDENTIAL_KEY)?.map(Credential::from_raw);
        if credential.is_some() {
            debug!("Loaded persisted credential");
        }

        Ok(Self {
            backend,
            state: RwLock::new(CredentialState {
                generation: 0,
                credential,
            }),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Arc::new(MemoryKeyValueStore::new()),
            state: RwLock::new(CredentialState::default()),
        }
    }

    pub fn current(&self) -> Option<Credential> {
        self.snapshot().credential
    }

    pub fn snapshot(&self) -> CredentialSnapshot {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        CredentialSnapshot {
            generation: state.generation,
            credential: state.credential.clone(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.snapshot().generation
    }

    /// Identity carried by the current credential
    pub fn claims(&self) -> Option<CredentialClaims> {
        self.current().and_then(|credential| credential.claims().ok())
    }

    /// Persist and adopt a new credential
    pub fn set(&self, credential: Credential) -> ClientResult<()> {
        let mut state = self.write_state();
        self.store_locked(&mut state, credential)
    }

    /// Forget the credential. The in-memory slot is cleared even if the
    /// backend fails, so a rejected credential is never sent again.
    pub fn clear(&self) -> ClientResult<()> {
        let mut state = self.write_state();
        self.clear_locked(&mut state)
    }

    /// Adopt `credential` only if the slot is still at `expected_generation`.
    ///
    /// Returns `false` without touching anything when a sign-in or sign-out
    /// happened in between.
    pub fn set_if_current(
        &self,
        expected_generation: u64,
        credential: Credential,
    ) -> ClientResult<bool> {
        let mut state = self.write_state();
        if state.generation != expected_generation {
            return Ok(false);
        }
        self.store_locked(&mut state, credential)?;
        Ok(true)
    }

    /// Forget the credential only if the slot is still at `expected_generation`
    pub fn clear_if_current(&self, expected_generation: u64) -> ClientResult<bool> {
        let mut state = self.write_state();
        if state.generation != expected_generation {
            return Ok(false);
        }
        self.clear_locked(&mut state)?;
        Ok(true)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CredentialState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    // Backend and slot change under the same write guard, so concurrent
    // set/clear calls apply to both in the same order.
    fn store_locked(&self, state: &mut CredentialState, credential: Credential) -> ClientResult<()> {
        self.backend.set(CREDENTIAL_KEY, credential.as_str())?;
        state.generation += 1;
        state.credential = Some(credential);
        Ok(())
    }

    fn clear_locked(&self, state: &mut CredentialState) -> ClientResult<()> {
        state.generation += 1;
        state.credential = None;
        self.backend.remove(CREDENTIAL_KEY).inspect_err(|e| {
            warn!("Failed to remove persisted credential: {}", e);
        })
    }
}
