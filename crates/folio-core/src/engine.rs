// ── Resource engine façade ──
//
// One `ResourceEngine<T>` per resource type wires store, coordinator,
// mutator and reconciler together. UI units mount it to get a
// `ResourceHandle`; dropping the handle unmounts.

use std::sync::Arc;
use std::time::Duration;

use folio_api::RealtimeMessage;
use tracing::debug;

use crate::auth::Authorizer;
use crate::error::CoreError;
use crate::fetch::{FetchCoordinator, FetchState};
use crate::ledger::PendingLedger;
use crate::model::{Resource, ResourceId};
use crate::mutation::OptimisticMutator;
use crate::realtime::{ApplyOutcome, RealtimeReconciler};
use crate::remote::RemoteSource;
use crate::store::ResourceStore;
use crate::subscribers::{SubscriberRegistry, Subscription};
use crate::view::{HookStatus, ResourceView, ResourceWatch};

/// Tuning shared by every engine of a session.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub fetch_timeout: Option<Duration>,
    pub echo_window: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: Some(Duration::from_secs(60)),
            echo_window: Duration::from_secs(10),
        }
    }
}

/// Synchronization engine for resource type `T`.
///
/// Cheaply cloneable; all clones share one cache.
pub struct ResourceEngine<T: Resource> {
    inner: Arc<EngineInner<T>>,
}

struct EngineInner<T: Resource> {
    registry: Arc<SubscriberRegistry>,
    store: Arc<ResourceStore<T>>,
    coordinator: Arc<FetchCoordinator<T>>,
    mutator: OptimisticMutator<T>,
    reconciler: Arc<RealtimeReconciler<T>>,
    ledger: Arc<PendingLedger<T>>,
    remote: Arc<dyn RemoteSource<T>>,
}

impl<T: Resource> Clone for ResourceEngine<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Resource> ResourceEngine<T> {
    pub fn new(
        remote: Arc<dyn RemoteSource<T>>,
        authorizer: Arc<dyn Authorizer>,
        options: EngineOptions,
    ) -> Self {
        let registry = SubscriberRegistry::new();
        let store = Arc::new(ResourceStore::new(Arc::clone(&registry)));
        let coordinator = FetchCoordinator::new(Arc::clone(&store), options.fetch_timeout);
        let ledger = Arc::new(PendingLedger::new(options.echo_window));
        let reconciler = Arc::new(RealtimeReconciler::new(
            Arc::clone(&store),
            Arc::clone(&ledger),
        ));
        let mutator = OptimisticMutator::new(
            Arc::clone(&store),
            Arc::clone(&remote),
            authorizer,
            Arc::clone(&ledger),
            Arc::clone(&reconciler),
        );

        Self {
            inner: Arc::new(EngineInner {
                registry,
                store,
                coordinator,
                mutator,
                reconciler,
                ledger,
                remote,
            }),
        }
    }

    // ── Mount lifecycle ──────────────────────────────────────────────

    /// Subscribe `on_change`, then make sure the collection is loaded.
    ///
    /// A failed load does not fail the mount: the handle reports it via
    /// [`ResourceHandle::error`] and keeps showing the last-good data.
    pub async fn mount<F>(&self, on_change: F) -> ResourceHandle<T>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let subscription = self.inner.registry.subscribe(on_change);
        let handle = ResourceHandle {
            engine: self.clone(),
            subscription: Some(subscription),
        };
        if let Err(e) = self.ensure_loaded(false).await {
            debug!(kind = %T::KIND, error = %e, "mount load failed");
        }
        handle
    }

    /// Load through the coordinator (coalesced with any load in flight).
    pub async fn ensure_loaded(&self, force: bool) -> Result<(), CoreError> {
        let remote = Arc::clone(&self.inner.remote);
        self.inner
            .coordinator
            .ensure_loaded(move || async move { remote.list().await }, force)
            .await
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.inner.store.snapshot()
    }

    pub fn get(&self, id: &ResourceId) -> Option<Arc<T>> {
        self.inner.store.get(id)
    }

    pub fn status(&self) -> HookStatus {
        self.inner.coordinator.state().into()
    }

    pub fn last_error(&self) -> Option<CoreError> {
        self.inner.coordinator.last_error()
    }

    /// Current items and status together.
    pub fn view(&self) -> ResourceView<T> {
        ResourceView {
            items: self.snapshot(),
            status: self.status(),
        }
    }

    /// Follow items and status as they change.
    pub fn watch(&self) -> ResourceWatch<T> {
        ResourceWatch::new(
            self.inner.store.subscribe(),
            self.inner.coordinator.subscribe_state(),
        )
    }

    pub fn store(&self) -> &Arc<ResourceStore<T>> {
        &self.inner.store
    }

    pub fn coordinator(&self) -> &Arc<FetchCoordinator<T>> {
        &self.inner.coordinator
    }

    pub fn mutator(&self) -> &OptimisticMutator<T> {
        &self.inner.mutator
    }

    pub fn reconciler(&self) -> &Arc<RealtimeReconciler<T>> {
        &self.inner.reconciler
    }

    pub fn subscribers(&self) -> &Arc<SubscriberRegistry> {
        &self.inner.registry
    }

    // ── Realtime / lifecycle ─────────────────────────────────────────

    pub fn on_message(&self, message: &RealtimeMessage) -> Option<ApplyOutcome> {
        self.inner.reconciler.on_message(message)
    }

    /// Whether the collection has been requested since the last reset.
    pub fn is_requested(&self) -> bool {
        self.inner.coordinator.state() != FetchState::Idle
    }

    /// Drop cached data and return to `Idle` (logout / forced reset).
    pub fn reset(&self) {
        self.inner.coordinator.reset();
        self.inner.ledger.reset();
        self.inner.store.clear();
    }
}

/// A mounted consumer's view of one resource type.
///
/// Dropping the handle unmounts: its callback is never invoked again.
pub struct ResourceHandle<T: Resource> {
    engine: ResourceEngine<T>,
    subscription: Option<Subscription>,
}

impl<T: Resource> std::fmt::Debug for ResourceHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("mounted", &self.is_mounted())
            .finish_non_exhaustive()
    }
}

impl<T: Resource> ResourceHandle<T> {
    pub fn data(&self) -> Arc<Vec<Arc<T>>> {
        self.engine.snapshot()
    }

    pub fn loading(&self) -> bool {
        self.status() == HookStatus::Loading
    }

    pub fn error(&self) -> Option<CoreError> {
        self.engine.last_error()
    }

    pub fn status(&self) -> HookStatus {
        self.engine.status()
    }

    pub fn watch(&self) -> ResourceWatch<T> {
        self.engine.watch()
    }

    pub async fn create(&self, draft: T::Draft) -> Result<Arc<T>, CoreError> {
        self.engine.inner.mutator.create(draft).await
    }

    pub async fn update(&self, id: &ResourceId, patch: T::Patch) -> Result<Arc<T>, CoreError> {
        self.engine.inner.mutator.update(id, patch).await
    }

    pub async fn remove(&self, id: &ResourceId) -> Result<(), CoreError> {
        self.engine.inner.mutator.remove(id).await
    }

    /// Forced reload. Joins a load already in flight.
    pub async fn refetch(&self) -> Result<(), CoreError> {
        self.engine.ensure_loaded(true).await
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.as_ref().is_some_and(Subscription::is_active)
    }

    pub fn unmount(mut self) {
        if let Some(sub) = self.subscription.take() {
            sub.unsubscribe();
        }
    }
}
