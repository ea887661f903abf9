// ── Pending-mutation ledger ──
//
// Shared by the mutator and the reconciler of one resource type. Records
// in-flight optimistic mutations, realtime events held back while they
// resolve, confirmation markers for echo suppression, and delete
// tombstones.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::model::{Resource, ResourceId};
use crate::realtime::{RealtimeEvent, RealtimeOperation};

/// Tombstones and temp-id aliases live at least this long, or the echo
/// window if that is longer.
const MIN_RETENTION: Duration = Duration::from_secs(60);

/// The kind of optimistic change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

/// An optimistic change awaiting server resolution.
#[derive(Debug, Clone)]
pub struct PendingMutation<T> {
    pub operation: MutationKind,
    /// Temporary id for creates.
    pub target_id: ResourceId,
    /// What the store shows while the mutation is pending (`None` for deletes).
    pub local_snapshot: Option<Arc<T>>,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HoldReason {
    /// A mutation for the event's id is pending.
    SameId,
    /// An insert for an unknown id while a create is pending; it may be
    /// the create's own echo.
    PendingCreate,
}

struct Confirmation {
    /// Server `updatedAt` of the confirmed row; `None` for deletes.
    updated_at: Option<DateTime<Utc>>,
    at: Instant,
}

struct Inner<T> {
    pending: HashMap<ResourceId, PendingMutation<T>>,
    creates: usize,
    held: Vec<(HoldReason, RealtimeEvent<T>)>,
    confirmations: HashMap<ResourceId, Confirmation>,
    /// Deleted id -> (server delete time, when recorded).
    tombstones: HashMap<ResourceId, (DateTime<Utc>, Instant)>,
    /// Temporary id -> (server id, when recorded).
    aliases: HashMap<ResourceId, (ResourceId, Instant)>,
}

impl<T> Default for Inner<T> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
            creates: 0,
            held: Vec::new(),
            confirmations: HashMap::new(),
            tombstones: HashMap::new(),
            aliases: HashMap::new(),
        }
    }
}

pub(crate) struct PendingLedger<T> {
    inner: Mutex<Inner<T>>,
    echo_window: Duration,
    retention: Duration,
}

impl<T: Resource> PendingLedger<T> {
    pub(crate) fn new(echo_window: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            echo_window,
            retention: echo_window.max(MIN_RETENTION),
        }
    }

    // ── Mutation side ────────────────────────────────────────────────

    pub(crate) fn begin(&self, mutation: PendingMutation<T>) {
        let mut inner = self.lock();
        if mutation.operation == MutationKind::Create {
            inner.creates += 1;
        }
        inner.pending.insert(mutation.target_id.clone(), mutation);
    }

    /// Resolve the mutation on `target`. `created` is the server id of a
    /// successful create. Returns held events that are no longer blocked.
    pub(crate) fn finish(
        &self,
        target: &ResourceId,
        created: Option<&ResourceId>,
    ) -> Vec<RealtimeEvent<T>> {
        let mut inner = self.lock();
        let was_create = inner
            .pending
            .remove(target)
            .is_some_and(|done| done.operation == MutationKind::Create);
        if was_create {
            inner.creates = inner.creates.saturating_sub(1);
        }

        let held = std::mem::take(&mut inner.held);
        let mut released = Vec::new();
        for (reason, event) in held {
            let blocked = match reason {
                HoldReason::SameId => inner.pending.contains_key(&event.target_id),
                HoldReason::PendingCreate => {
                    inner.creates > 0 && created != Some(&event.target_id)
                }
            };
            if blocked {
                inner.held.push((reason, event));
            } else {
                released.push(event);
            }
        }
        released
    }

    /// Record a server-confirmed write so its realtime echo is recognized.
    pub(crate) fn confirm(&self, id: ResourceId, updated_at: Option<DateTime<Utc>>) {
        let mut inner = self.lock();
        let window = self.echo_window;
        inner
            .confirmations
            .retain(|_, c| c.at.elapsed() <= window);
        inner.confirmations.insert(
            id,
            Confirmation {
                updated_at,
                at: Instant::now(),
            },
        );
    }

    /// Remember that a queued mutation on a temporary id now targets the
    /// server id.
    pub(crate) fn alias(&self, temporary: ResourceId, server: ResourceId) {
        let mut inner = self.lock();
        let retention = self.retention;
        inner.aliases.retain(|_, (_, at)| at.elapsed() <= retention);
        inner.aliases.insert(temporary, (server, Instant::now()));
    }

    pub(crate) fn resolve_alias(&self, id: &ResourceId) -> ResourceId {
        self.lock()
            .aliases
            .get(id)
            .filter(|(_, at)| at.elapsed() <= self.retention)
            .map_or_else(|| id.clone(), |(server, _)| server.clone())
    }

    // ── Realtime side ────────────────────────────────────────────────

    /// Hold `event` if a pending mutation could conflict with it. Returns
    /// the event back when it may be applied now. `known` says whether the
    /// store currently has the target id.
    pub(crate) fn try_hold(
        &self,
        event: RealtimeEvent<T>,
        known: bool,
    ) -> Result<(), RealtimeEvent<T>> {
        let mut inner = self.lock();
        let reason = if inner.pending.contains_key(&event.target_id) {
            Some(HoldReason::SameId)
        } else if inner.creates > 0 && !known && event.operation == RealtimeOperation::Insert {
            Some(HoldReason::PendingCreate)
        } else {
            None
        };
        match reason {
            Some(reason) => {
                inner.held.push((reason, event));
                Ok(())
            }
            None => Err(event),
        }
    }

    /// Whether an event with `event_time` for `id` is the echo of a write
    /// this client already confirmed.
    pub(crate) fn is_echo(
        &self,
        id: &ResourceId,
        operation: RealtimeOperation,
        event_time: Option<DateTime<Utc>>,
    ) -> bool {
        let inner = self.lock();
        let Some(c) = inner.confirmations.get(id) else {
            return false;
        };
        if c.at.elapsed() > self.echo_window {
            return false;
        }
        match (c.updated_at, operation) {
            (None, RealtimeOperation::Delete) => true,
            (Some(confirmed), RealtimeOperation::Insert | RealtimeOperation::Update) => {
                event_time.is_none_or(|t| t <= confirmed)
            }
            _ => false,
        }
    }

    pub(crate) fn tombstone(&self, id: ResourceId, at: DateTime<Utc>) {
        let mut inner = self.lock();
        let retention = self.retention;
        inner
            .tombstones
            .retain(|_, (_, recorded)| recorded.elapsed() <= retention);
        let now = Instant::now();
        let entry = inner.tombstones.entry(id).or_insert((at, now));
        if at > entry.0 {
            *entry = (at, now);
        }
    }

    pub(crate) fn tombstoned_at(&self, id: &ResourceId) -> Option<DateTime<Utc>> {
        self.lock()
            .tombstones
            .get(id)
            .filter(|(_, recorded)| recorded.elapsed() <= self.retention)
            .map(|(at, _)| *at)
    }

    // ── Diagnostics / lifecycle ──────────────────────────────────────

    pub(crate) fn pending(&self) -> Vec<PendingMutation<T>> {
        self.lock().pending.values().cloned().collect()
    }

    #[cfg(test)]
    pub(crate) fn held_len(&self) -> usize {
        self.lock().held.len()
    }

    #[cfg(test)]
    fn retained(&self) -> (usize, usize) {
        let inner = self.lock();
        (inner.tombstones.len(), inner.aliases.len())
    }

    /// Forget markers, tombstones and held events. Pending mutations stay
    /// registered so their resolution still balances the books.
    pub(crate) fn reset(&self) {
        let mut inner = self.lock();
        inner.held.clear();
        inner.confirmations.clear();
        inner.tombstones.clear();
        inner.aliases.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
