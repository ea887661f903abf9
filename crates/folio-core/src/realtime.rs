// ── Realtime reconciliation ──
//
// Merges push events into the store. Application is idempotent and
// ordered by server time, not arrival: an event older than the stored
// row is dropped, and deletes leave a tombstone so a late insert or
// update cannot resurrect the row.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use folio_api::{ChangeType, RealtimeMessage};
use tracing::debug;

use crate::ledger::PendingLedger;
use crate::model::{Resource, ResourceId, ResourceKind};
use crate::store::ResourceStore;

/// Row-level operation carried by a push event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealtimeOperation {
    Insert,
    Update,
    Delete,
}

impl From<ChangeType> for RealtimeOperation {
    fn from(change: ChangeType) -> Self {
        match change {
            ChangeType::Insert => Self::Insert,
            ChangeType::Update => Self::Update,
            ChangeType::Delete => Self::Delete,
        }
    }
}

impl fmt::Display for RealtimeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// A decoded push event for resource type `T`.
#[derive(Debug, Clone)]
pub struct RealtimeEvent<T> {
    pub operation: RealtimeOperation,
    pub kind: ResourceKind,
    pub target_id: ResourceId,
    /// The row after the change. Always present for insert / update.
    pub record: Option<T>,
    /// Server commit time, falling back to the row's own timestamp.
    pub server_timestamp: Option<DateTime<Utc>>,
}

impl<T: Resource> RealtimeEvent<T> {
    /// Decode a wire message. `None` for other tables or rows that do not
    /// parse as `T`.
    pub fn decode(message: &RealtimeMessage) -> Option<Self> {
        if message.table != T::KIND.table() {
            return None;
        }
        let operation = RealtimeOperation::from(message.event_type);
        let commit = message
            .commit_timestamp
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc));

        match operation {
            RealtimeOperation::Insert | RealtimeOperation::Update => {
                let row = message.new_record.clone()?;
                let record: T = serde_json::from_value(row).ok()?;
                Some(Self {
                    operation,
                    kind: T::KIND,
                    target_id: record.id().clone(),
                    server_timestamp: commit.or(Some(record.updated_at())),
                    record: Some(record),
                })
            }
            RealtimeOperation::Delete => {
                let old = message
                    .old_record
                    .as_ref()
                    .or(message.new_record.as_ref())?;
                let target_id = ResourceId::from_record(old)?;
                let old_time = old
                    .get("updatedAt")
                    .and_then(serde_json::Value::as_str)
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|t| t.with_timezone(&Utc));
                Some(Self {
                    operation,
                    kind: T::KIND,
                    target_id,
                    record: None,
                    server_timestamp: commit.or(old_time),
                })
            }
        }
    }

    /// Time compared against the stored row: the server timestamp, else
    /// the row's own `updatedAt`.
    pub fn event_time(&self) -> Option<DateTime<Utc>> {
        self.server_timestamp
            .or_else(|| self.record.as_ref().map(Resource::updated_at))
    }
}

/// Why an event left the store untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Echo of a write this client already confirmed.
    Echo,
    /// Older than the stored row.
    Stale,
    /// Update / delete for an id the store does not hold.
    UnknownId,
    /// Insert / update for a row deleted at a later time.
    Tombstoned,
    /// Applying it would not change anything.
    Unchanged,
}

/// Result of applying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Parked until the pending mutation on the same id resolves.
    Held,
    Discarded(DiscardReason),
}

/// Applies realtime events for one resource type.
pub struct RealtimeReconciler<T: Resource> {
    store: Arc<ResourceStore<T>>,
    ledger: Arc<PendingLedger<T>>,
}

impl<T: Resource> RealtimeReconciler<T> {
    pub(crate) fn new(store: Arc<ResourceStore<T>>, ledger: Arc<PendingLedger<T>>) -> Self {
        Self { store, ledger }
    }

    /// Decode and apply a wire message. `None` when the message is for
    /// another table or malformed (a silent no-op).
    pub fn on_message(&self, message: &RealtimeMessage) -> Option<ApplyOutcome> {
        if message.table != T::KIND.table() {
            return None;
        }
        let Some(event) = RealtimeEvent::decode(message) else {
            debug!(
                kind = %T::KIND,
                op = %message.event_type,
                "ignoring malformed realtime message"
            );
            return None;
        };
        Some(self.apply(event))
    }

    /// Apply one event, reading the store at handling time.
    pub fn apply(&self, event: RealtimeEvent<T>) -> ApplyOutcome {
        let id = event.target_id.clone();
        let op = event.operation;

        let known = self.store.contains(&id);
        let event = match self.ledger.try_hold(event, known) {
            Ok(()) => {
                debug!(kind = %T::KIND, %op, %id, "holding event behind pending mutation");
                return ApplyOutcome::Held;
            }
            Err(event) => event,
        };

        let outcome = self.apply_now(event);
        debug!(kind = %T::KIND, %op, %id, ?outcome, "realtime event");
        outcome
    }

    /// Re-apply events released by a resolved mutation.
    pub(crate) fn replay(&self, events: Vec<RealtimeEvent<T>>) {
        for event in events {
            self.apply(event);
        }
    }

    fn apply_now(&self, event: RealtimeEvent<T>) -> ApplyOutcome {
        let time = event.event_time();
        if self.ledger.is_echo(&event.target_id, event.operation, time) {
            return ApplyOutcome::Discarded(DiscardReason::Echo);
        }

        match event.operation {
            RealtimeOperation::Insert | RealtimeOperation::Update => {
                let Some(record) = event.record else {
                    return ApplyOutcome::Discarded(DiscardReason::UnknownId);
                };
                let at = time.unwrap_or_else(|| record.updated_at());
                if self
                    .ledger
                    .tombstoned_at(&event.target_id)
                    .is_some_and(|deleted| at <= deleted)
                {
                    return ApplyOutcome::Discarded(DiscardReason::Tombstoned);
                }
                match self.store.get(&event.target_id) {
                    None if event.operation == RealtimeOperation::Update => {
                        ApplyOutcome::Discarded(DiscardReason::UnknownId)
                    }
                    Some(stored) if at < stored.updated_at() => {
                        ApplyOutcome::Discarded(DiscardReason::Stale)
                    }
                    _ => {
                        if self.store.upsert(record) {
                            ApplyOutcome::Applied
                        } else {
                            ApplyOutcome::Discarded(DiscardReason::Unchanged)
                        }
                    }
                }
            }
            RealtimeOperation::Delete => {
                let Some(stored) = self.store.get(&event.target_id) else {
                    // Remember it anyway: the insert may still be in transit.
                    if let Some(at) = event.server_timestamp {
                        self.ledger.tombstone(event.target_id, at);
                    }
                    return ApplyOutcome::Discarded(DiscardReason::UnknownId);
                };
                if event.server_timestamp.is_some_and(|t| t < stored.updated_at()) {
                    return ApplyOutcome::Discarded(DiscardReason::Stale);
                }
                self.store.remove(&event.target_id);
                let at = event.server_timestamp.unwrap_or_else(|| stored.updated_at());
                self.ledger.tombstone(event.target_id, at);
                ApplyOutcome::Applied
            }
        }
    }
}
