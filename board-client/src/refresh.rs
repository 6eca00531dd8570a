//! Single-flight session refresh
//!
//! When the server says a session is stale, the client reissues its
//! credential once and replays the failed request. Any number of requests
//! can hit the stale answer at the same time; they all wait on the same
//! reissue call and then replay with its result.
//!
//! The reissue runs on its own task. A waiter that is dropped does not
//! cancel the reissue for anyone else.

use board_core::{AuthError, Credential};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};
use crate::store::CredentialStore;
use crate::transport::{ApiRequest, Transport};

/// Path of the reissue endpoint
pub const REISSUE_PATH: &str = "/sessions";

type RefreshOutcome = ClientResult<Credential>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

struct InFlight {
    id: u64,
    future: SharedRefresh,
}

type Slot = Arc<Mutex<Option<InFlight>>>;

/// Coordinates credential reissue across concurrent requests
pub struct RefreshCoordinator {
    transport: Arc<dyn Transport>,
    store: Arc<CredentialStore>,
    in_flight: Slot,
    next_id: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<CredentialStore>) -> Self {
        Self {
            transport,
            store,
            in_flight: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(1),
        }
    }

    /// Whether a reissue is currently outstanding
    pub fn is_refreshing(&self) -> bool {
        lock(&self.in_flight).is_some()
    }

    /// Get a fresh credential for a request that was sent with store
    /// generation `observed_generation` and came back stale.
    ///
    /// Joins the outstanding reissue if there is one. If the store moved on
    /// since the request was sent, the current credential is returned
    /// without asking the server again.
    pub async fn refresh(&self, observed_generation: u64) -> RefreshOutcome {
        let future = {
            let mut slot = lock(&self.in_flight);

            if let Some(in_flight) = slot.as_ref() {
                debug!("Joining refresh {} already in progress", in_flight.id);
                in_flight.future.clone()
            } else {
                let snapshot = self.store.snapshot();
                let Some(credential) = snapshot.credential else {
                    return Err(ClientError::Rejected(AuthError::Unauthenticated));
                };

                if snapshot.generation != observed_generation {
                    debug!("Credential already replaced, skipping reissue");
                    return Ok(credential);
                }

                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let handle = tokio::spawn(run_reissue(
                    self.transport.clone(),
                    self.store.clone(),
                    self.in_flight.clone(),
                    id,
                    snapshot.generation,
                    credential,
                ));

                let future = async move {
                    match handle.await {
                        Ok(outcome) => outcome,
                        Err(e) => Err(ClientError::InvalidResponse(format!(
                            "Refresh task failed: {}",
                            e
                        ))),
                    }
                }
                .boxed()
                .shared();

                *slot = Some(InFlight {
                    id,
                    future: future.clone(),
                });
                future
            }
        };

        future.await
    }
}

async fn run_reissue(
    transport: Arc<dyn Transport>,
    store: Arc<CredentialStore>,
    slot: Slot,
    id: u64,
    generation: u64,
    credential: Credential,
) -> RefreshOutcome {
    info!("Session stale, reissuing credential (refresh {})", id);

    let request = ApiRequest::put(REISSUE_PATH)
        .with_credential(Some(&credential))
        .without_refresh();

    let outcome = match transport.send(request).await.and_then(|r| r.into_result()) {
        Ok(response) => {
            let fresh = Credential::from_raw(response.body);
            match fresh.claims() {
                Ok(_) => Ok(fresh),
                Err(e) => Err(ClientError::InvalidResponse(e.to_string())),
            }
        }
        Err(e) => Err(e),
    };

    // Store update and slot release happen under the slot lock so a new
    // waiter sees either the old refresh or the new generation, never a gap.
    // A sign-in or sign-out made while the reissue was out wins over its result.
    let mut guard = lock(&slot);
    let outcome = match outcome {
        Ok(fresh) => match store.set_if_current(generation, fresh.clone()) {
            Ok(true) => Ok(fresh),
            Ok(false) => superseded(&store),
            Err(e) => Err(e),
        },
        Err(ClientError::Rejected(kind)) => {
            warn!("Reissue rejected ({}), signing out", kind.code());
            // A backend failure was already logged; the slot is empty regardless
            match store.clear_if_current(generation) {
                Ok(false) => superseded(&store),
                _ => Err(ClientError::Rejected(AuthError::Unauthenticated)),
            }
        }
        Err(e) => {
            warn!("Reissue failed, keeping credential: {}", e);
            Err(e)
        }
    };

    if guard.as_ref().is_some_and(|in_flight| in_flight.id == id) {
        *guard = None;
    }
    outcome
}

/// Outcome for waiters whose credential changed hands while the reissue ran
fn superseded(store: &CredentialStore) -> RefreshOutcome {
    debug!("Credential changed during reissue, discarding its result");
    store
        .current()
        .ok_or(ClientError::Rejected(AuthError::Unauthenticated))
}

fn lock(slot: &Mutex<Option<InFlight>>) -> MutexGuard<'_, Option<InFlight>> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}
