// ── Fetch coordination ──
//
// One coordinator per resource type. Concurrent `ensure_loaded` calls
// share a single in-flight load; the load runs on its own task so a
// caller that goes away (unmount) does not cancel it for the others.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::Resource;
use crate::store::ResourceStore;

/// Load lifecycle of one resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    InFlight,
    Loaded,
    Failed,
}

impl FetchState {
    pub fn is_in_flight(self) -> bool {
        self == Self::InFlight
    }

    pub fn is_loaded(self) -> bool {
        self == Self::Loaded
    }

    pub fn is_failed(self) -> bool {
        self == Self::Failed
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::InFlight => "in_flight",
            Self::Loaded => "loaded",
            Self::Failed => "failed",
        })
    }
}

type LoadFuture = Shared<BoxFuture<'static, Result<(), CoreError>>>;

#[derive(Default)]
struct Slot {
    state: FetchState,
    /// Bumped whenever a load starts, is released, or the slot is reset.
    /// A completing load only writes if its generation is still current.
    generation: u64,
    in_flight: Option<(LoadFuture, AbortHandle)>,
    last_error: Option<CoreError>,
}

/// Guarantees at most one in-flight load per resource type.
pub struct FetchCoordinator<T: Resource> {
    store: Arc<ResourceStore<T>>,
    slot: Mutex<Slot>,
    state_tx: watch::Sender<FetchState>,
    fetch_timeout: Option<Duration>,
}

impl<T: Resource> FetchCoordinator<T> {
    pub(crate) fn new(store: Arc<ResourceStore<T>>, fetch_timeout: Option<Duration>) -> Arc<Self> {
        let (state_tx, _) = watch::channel(FetchState::Idle);
        Arc::new(Self {
            store,
            slot: Mutex::new(Slot::default()),
            state_tx,
            fetch_timeout,
        })
    }

    /// Make sure the collection is loaded.
    ///
    /// - a load already in flight is joined, never duplicated (even when
    ///   `force` is set);
    /// - `Loaded` returns immediately unless `force`;
    /// - `Idle` and `Failed` start a new load.
    ///
    /// On failure the previous data stays in the store and every joined
    /// caller receives the same error.
    pub(crate) async fn ensure_loaded<F, Fut>(
        self: &Arc<Self>,
        fetch: F,
        force: bool,
    ) -> Result<(), CoreError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<T>, CoreError>> + Send + 'static,
    {
        let (load, started) = {
            let mut slot = self.lock();
            if let Some((load, _)) = &slot.in_flight {
                debug!(kind = %T::KIND, "joining in-flight load");
                (load.clone(), false)
            } else if slot.state == FetchState::Loaded && !force {
                return Ok(());
            } else {
                slot.generation += 1;
                let (load, abort) = self.spawn_load(slot.generation, fetch);
                slot.in_flight = Some((load.clone(), abort));
                slot.state = FetchState::InFlight;
                (load, true)
            }
        };

        if started {
            debug!(kind = %T::KIND, force, "load started");
            self.publish(FetchState::InFlight);
        }
        load.await
    }

    /// Force-fail a stuck load and free the slot for the next caller.
    /// A late result from the released load is discarded.
    pub fn release(&self) {
        let released = {
            let mut slot = self.lock();
            match slot.in_flight.take() {
                Some((_, abort)) => {
                    abort.abort();
                    slot.generation += 1;
                    slot.state = FetchState::Failed;
                    slot.last_error = Some(CoreError::Cancelled);
                    true
                }
                None => false,
            }
        };
        if released {
            warn!(kind = %T::KIND, "in-flight load released");
            self.publish(FetchState::Failed);
        }
    }

    /// Back to `Idle`, abandoning any in-flight load. Used on logout and
    /// forced cache reset; the caller clears the store.
    pub fn reset(&self) {
        {
            let mut slot = self.lock();
            if let Some((_, abort)) = slot.in_flight.take() {
                abort.abort();
            }
            slot.generation += 1;
            slot.state = FetchState::Idle;
            slot.last_error = None;
        }
        debug!(kind = %T::KIND, "fetch state reset");
        self.publish(FetchState::Idle);
    }

    pub fn state(&self) -> FetchState {
        self.lock().state
    }

    /// Error from the most recent failed load, cleared by the next success.
    pub fn last_error(&self) -> Option<CoreError> {
        self.lock().last_error.clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<FetchState> {
        self.state_tx.subscribe()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn spawn_load<F, Fut>(self: &Arc<Self>, generation: u64, fetch: F) -> (LoadFuture, AbortHandle)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<T>, CoreError>> + Send + 'static,
    {
        let this = Arc::clone(self);
        let timeout = self.fetch_timeout;
        let task = tokio::spawn(async move {
            let load = fetch();
            let result = match timeout {
                Some(limit) => tokio::time::timeout(limit, load).await.unwrap_or_else(|_| {
                    Err(CoreError::Timeout {
                        timeout_secs: limit.as_secs(),
                    })
                }),
                None => load.await,
            };
            this.complete(generation, result)
        });
        let abort = task.abort_handle();

        let shared = async move {
            match task.await {
                Ok(result) => result,
                Err(e) if e.is_cancelled() => Err(CoreError::Cancelled),
                Err(e) => Err(CoreError::Internal(format!("load task failed: {e}"))),
            }
        }
        .boxed()
        .shared();
        (shared, abort)
    }

    /// Record a finished load. The store is written before the slot
    /// leaves `InFlight`, so a caller that sees `Loaded` also sees the rows,
    /// and a reset that bumped the generation first is never undone.
    fn complete(&self, generation: u64, result: Result<Vec<T>, CoreError>) -> Result<(), CoreError> {
        let (state, outcome) = {
            let mut slot = self.lock();
            if slot.generation != generation {
                debug!(kind = %T::KIND, "discarding result of superseded load");
                return result.map(|_| ());
            }
            slot.in_flight = None;
            match result {
                Ok(items) => {
                    let count = items.len();
                    let changed = self.store.replace_all(items);
                    slot.state = FetchState::Loaded;
                    slot.last_error = None;
                    debug!(kind = %T::KIND, count, changed, "load complete");
                    (FetchState::Loaded, Ok(()))
                }
                Err(e) => {
                    slot.state = FetchState::Failed;
                    slot.last_error = Some(e.clone());
                    warn!(kind = %T::KIND, error = %e, "load failed, keeping last-good data");
                    (FetchState::Failed, Err(e))
                }
            }
        };
        self.publish(state);
        outcome
    }

    fn publish(&self, state: FetchState) {
        self.state_tx.send_replace(state);
        self.store.registry().notify();
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
