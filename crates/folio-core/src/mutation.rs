// ── Optimistic mutations ──
//
// Edits land in the store immediately, then go to the server. Success
// swaps in the server's row; failure rolls back and returns the error.
// Mutations on the same id are queued, never interleaved.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::auth::Authorizer;
use crate::error::CoreError;
use crate::ledger::{MutationKind, PendingLedger, PendingMutation};
use crate::model::{Resource, ResourceId};
use crate::realtime::RealtimeReconciler;
use crate::remote::RemoteSource;
use crate::store::ResourceStore;

/// Queue slot for one id. Dropping it frees the id for the next mutation.
struct IdTurn {
    id: ResourceId,
    guard: Option<OwnedMutexGuard<()>>,
    lanes: Arc<DashMap<ResourceId, Arc<AsyncMutex<()>>>>,
}

impl Drop for IdTurn {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map still holds the lane: nobody is queued behind us.
        self.lanes
            .remove_if(&self.id, |_, lane| Arc::strong_count(lane) == 1);
    }
}

/// Generic optimistic mutator for resource type `T`.
pub struct OptimisticMutator<T: Resource> {
    store: Arc<ResourceStore<T>>,
    remote: Arc<dyn RemoteSource<T>>,
    authorizer: Arc<dyn Authorizer>,
    ledger: Arc<PendingLedger<T>>,
    reconciler: Arc<RealtimeReconciler<T>>,
    lanes: Arc<DashMap<ResourceId, Arc<AsyncMutex<()>>>>,
}

impl<T: Resource> OptimisticMutator<T> {
    pub(crate) fn new(
        store: Arc<ResourceStore<T>>,
        remote: Arc<dyn RemoteSource<T>>,
        authorizer: Arc<dyn Authorizer>,
        ledger: Arc<PendingLedger<T>>,
        reconciler: Arc<RealtimeReconciler<T>>,
    ) -> Self {
        Self {
            store,
            remote,
            authorizer,
            ledger,
            reconciler,
            lanes: Arc::new(DashMap::new()),
        }
    }

    /// Insert an optimistic row under a temporary id, then promote it to
    /// the server's row (and id) once the create succeeds.
    pub async fn create(&self, draft: T::Draft) -> Result<Arc<T>, CoreError> {
        self.authorize("create")?;

        let temp_id = ResourceId::temporary();
        let _turn = self.turn(&temp_id).await;
        let optimistic = Arc::new(T::from_draft(temp_id.clone(), &draft, Utc::now()));

        self.ledger.begin(PendingMutation {
            operation: MutationKind::Create,
            target_id: temp_id.clone(),
            local_snapshot: Some(Arc::clone(&optimistic)),
            issued_at: Utc::now(),
        });
        self.store.put_arc(optimistic);
        debug!(kind = %T::KIND, id = %temp_id, "optimistic create");

        match self.remote.create(&draft).await {
            Ok(server) => {
                let server_id = server.id().clone();
                self.ledger.confirm(server_id.clone(), Some(server.updated_at()));
                self.ledger.alias(temp_id.clone(), server_id.clone());
                self.store.replace(&temp_id, server);
                let held = self.ledger.finish(&temp_id, Some(&server_id));
                self.reconciler.replay(held);
                debug!(kind = %T::KIND, temp = %temp_id, id = %server_id, "create confirmed");
                self.store
                    .get(&server_id)
                    .ok_or_else(|| CoreError::not_found(T::KIND, &server_id))
            }
            Err(e) => {
                self.store.remove(&temp_id);
                let held = self.ledger.finish(&temp_id, None);
                self.reconciler.replay(held);
                warn!(kind = %T::KIND, id = %temp_id, error = %e, "create rolled back");
                Err(e)
            }
        }
    }

    /// Apply `patch` locally, then on the server.
    pub async fn update(&self, id: &ResourceId, patch: T::Patch) -> Result<Arc<T>, CoreError> {
        self.authorize("update")?;

        let (id, _turn) = self.queue(id).await;
        let previous = self
            .store
            .get(&id)
            .ok_or_else(|| CoreError::not_found(T::KIND, &id))?;

        let mut next = T::clone(&previous);
        next.apply_patch(&patch);
        let optimistic = Arc::new(next);

        self.ledger.begin(PendingMutation {
            operation: MutationKind::Update,
            target_id: id.clone(),
            local_snapshot: Some(Arc::clone(&optimistic)),
            issued_at: Utc::now(),
        });
        self.store.put_arc(Arc::clone(&optimistic));
        debug!(kind = %T::KIND, %id, "optimistic update");

        match self.remote.update(&id, &patch).await {
            Ok(server) => {
                self.ledger.confirm(id.clone(), Some(server.updated_at()));
                self.store.put(server);
                let held = self.ledger.finish(&id, None);
                self.reconciler.replay(held);
                debug!(kind = %T::KIND, %id, "update confirmed");
                self.store
                    .get(&id)
                    .ok_or_else(|| CoreError::not_found(T::KIND, &id))
            }
            Err(e) => {
                // Only undo our own write; anything newer stays.
                let still_ours = self
                    .store
                    .get(&id)
                    .is_some_and(|current| Arc::ptr_eq(&current, &optimistic));
                if still_ours {
                    self.store.put_arc(previous);
                }
                let held = self.ledger.finish(&id, None);
                self.reconciler.replay(held);
                warn!(kind = %T::KIND, %id, error = %e, "update rolled back");
                Err(e)
            }
        }
    }

    /// Remove locally, then on the server. Unknown ids fail with
    /// `NotFound` without touching the store.
    pub async fn remove(&self, id: &ResourceId) -> Result<(), CoreError> {
        self.authorize("delete")?;

        let (id, _turn) = self.queue(id).await;
        let (Some(previous), Some(index)) = (self.store.get(&id), self.store.position(&id)) else {
            return Err(CoreError::not_found(T::KIND, &id));
        };

        self.ledger.begin(PendingMutation {
            operation: MutationKind::Delete,
            target_id: id.clone(),
            local_snapshot: None,
            issued_at: Utc::now(),
        });
        self.store.remove(&id);
        debug!(kind = %T::KIND, %id, "optimistic delete");

        match self.remote.delete(&id).await {
            Ok(()) => {
                self.ledger.confirm(id.clone(), None);
                self.ledger.tombstone(id.clone(), previous.updated_at().max(Utc::now()));
                let held = self.ledger.finish(&id, None);
                self.reconciler.replay(held);
                debug!(kind = %T::KIND, %id, "delete confirmed");
                Ok(())
            }
            Err(e) => {
                self.store.restore_at(index, previous);
                let held = self.ledger.finish(&id, None);
                self.reconciler.replay(held);
                warn!(kind = %T::KIND, %id, error = %e, "delete rolled back");
                Err(e)
            }
        }
    }

    /// Mutations awaiting server resolution.
    pub fn pending(&self) -> Vec<PendingMutation<T>> {
        self.ledger.pending()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn authorize(&self, op: &str) -> Result<(), CoreError> {
        if self.authorizer.is_admin() {
            Ok(())
        } else {
            Err(CoreError::Unauthorized {
                message: format!("admin role required to {op} {}", T::KIND),
            })
        }
    }

    /// Wait for our turn on `id`. A temporary id whose create has since
    /// been confirmed is followed to the server id.
    async fn queue(&self, id: &ResourceId) -> (ResourceId, IdTurn) {
        let turn = self.turn(id).await;
        let resolved = self.ledger.resolve_alias(id);
        if resolved == *id {
            return (resolved, turn);
        }
        drop(turn);
        let turn = self.turn(&resolved).await;
        (resolved, turn)
    }

    async fn turn(&self, id: &ResourceId) -> IdTurn {
        let lane = Arc::clone(
            self.lanes
                .entry(id.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .value(),
        );
        let guard = lane.lock_owned().await;
        IdTurn {
            id: id.clone(),
            guard: Some(guard),
            lanes: Arc::clone(&self.lanes),
        }
    }
}
