// ── Generic reactive resource collection ──
//
// Ordered storage keyed by `ResourceId` with push-based change
// notification: a `watch` snapshot for async consumers and the
// `SubscriberRegistry` for synchronous callbacks.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use tokio::sync::watch;
use tracing::trace;

use crate::model::{Resource, ResourceId};
use crate::subscribers::SubscriberRegistry;

type Snapshot<T> = Arc<Vec<Arc<T>>>;

/// The canonical collection for one resource type.
///
/// Insertion order is preserved. Writes that leave the contents unchanged
/// keep the current snapshot `Arc` and do not notify, so consumers can use
/// pointer equality to skip work.
pub struct ResourceStore<T: Resource> {
    items: RwLock<IndexMap<ResourceId, Arc<T>>>,

    /// Version counter, bumped on every effective change.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on change for cheap reads and subscription.
    snapshot: watch::Sender<Snapshot<T>>,

    registry: Arc<SubscriberRegistry>,
}

impl<T: Resource> ResourceStore<T> {
    pub(crate) fn new(registry: Arc<SubscriberRegistry>) -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            items: RwLock::new(IndexMap::new()),
            version,
            snapshot,
            registry,
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Current contents. Pointer-equal across calls until the next change.
    pub fn snapshot(&self) -> Snapshot<T> {
        self.snapshot.borrow().clone()
    }

    pub fn get(&self, id: &ResourceId) -> Option<Arc<T>> {
        self.read().get(id).cloned()
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Monotonic change counter.
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.snapshot.subscribe()
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Overwrite the whole collection. Unchanged items keep their `Arc`.
    /// Returns `true` if anything changed.
    ///
    /// Registry callbacks are not run here: the fetch coordinator applies
    /// loads under its slot lock and notifies once the new fetch state is
    /// published.
    pub(crate) fn replace_all(&self, items: Vec<T>) -> bool {
        let mut map = self.write();
        let mut next: IndexMap<ResourceId, Arc<T>> = IndexMap::with_capacity(items.len());
        for item in items {
            let id = item.id().clone();
            let entry = match map.get(&id) {
                Some(existing) if **existing == item => Arc::clone(existing),
                _ => Arc::new(item),
            };
            next.insert(id, entry);
        }

        let same = next.len() == map.len()
            && next
                .iter()
                .zip(map.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && Arc::ptr_eq(va, vb));
        if same {
            return false;
        }
        *map = next;
        self.publish(&map);
        true
    }

    /// Insert if the id is unknown, otherwise shallow-merge into the
    /// existing item. Returns `true` if anything changed.
    pub(crate) fn upsert(&self, item: T) -> bool {
        let changed = {
            let mut map = self.write();
            let id = item.id().clone();
            let next = match map.get(&id) {
                Some(existing) => {
                    let mut merged = T::clone(existing);
                    merged.merge(item);
                    (merged != **existing).then_some(merged)
                }
                None => Some(item),
            };
            match next {
                Some(value) => {
                    map.insert(id, Arc::new(value));
                    self.publish(&map);
                    true
                }
                None => false,
            }
        };
        self.finish(changed, "upsert")
    }

    /// Authoritative overwrite of a single item (no merge).
    pub(crate) fn put(&self, item: T) -> bool {
        self.put_arc(Arc::new(item))
    }

    pub(crate) fn put_arc(&self, item: Arc<T>) -> bool {
        let changed = {
            let mut map = self.write();
            let id = item.id().clone();
            let unchanged = map.get(&id).is_some_and(|existing| **existing == *item);
            if unchanged {
                false
            } else {
                map.insert(id, item);
                self.publish(&map);
                true
            }
        };
        self.finish(changed, "put")
    }

    /// Swap the entry keyed by `old_id` for `item`, keeping its position.
    ///
    /// Used to promote an optimistic create to its server id. Falls back to
    /// an insert if `old_id` is gone. Any other entry already holding the
    /// new id is dropped so ids stay unique.
    pub(crate) fn replace(&self, old_id: &ResourceId, item: T) -> bool {
        let changed = {
            let mut map = self.write();
            let new_id = item.id().clone();
            match map.get_index_of(old_id) {
                Some(index) => {
                    if new_id != *old_id {
                        map.shift_remove(&new_id);
                    }
                    // Index may have shifted if the duplicate sat before it.
                    let index = map.get_index_of(old_id).unwrap_or(index);
                    map.shift_remove_index(index);
                    let index = index.min(map.len());
                    map.shift_insert(index, new_id, Arc::new(item));
                }
                None => {
                    map.insert(new_id, Arc::new(item));
                }
            }
            self.publish(&map);
            true
        };
        self.finish(changed, "replace")
    }

    /// Remove by id. A no-op for unknown ids.
    pub(crate) fn remove(&self, id: &ResourceId) -> Option<Arc<T>> {
        let removed = {
            let mut map = self.write();
            let removed = map.shift_remove(id);
            if removed.is_some() {
                self.publish(&map);
            }
            removed
        };
        self.finish(removed.is_some(), "remove");
        removed
    }

    pub(crate) fn position(&self, id: &ResourceId) -> Option<usize> {
        self.read().get_index_of(id)
    }

    /// Put `item` back at `index` if its id is absent. Used to undo a remove.
    pub(crate) fn restore_at(&self, index: usize, item: Arc<T>) -> bool {
        let changed = {
            let mut map = self.write();
            let id = item.id().clone();
            if map.contains_key(&id) {
                false
            } else {
                let index = index.min(map.len());
                map.shift_insert(index, id, item);
                self.publish(&map);
                true
            }
        };
        self.finish(changed, "restore")
    }

    /// Drop every item (logout / cache reset).
    pub(crate) fn clear(&self) {
        let changed = {
            let mut map = self.write();
            if map.is_empty() {
                false
            } else {
                map.clear();
                self.publish(&map);
                true
            }
        };
        self.finish(changed, "clear");
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Rebuild the snapshot and bump the version. Runs under the write lock
    /// so snapshots are published in the same order as writes.
    fn publish(&self, map: &IndexMap<ResourceId, Arc<T>>) {
        let values: Vec<Arc<T>> = map.values().cloned().collect();
        // `send_replace` updates unconditionally, even with zero receivers.
        self.snapshot.send_replace(Arc::new(values));
        self.version.send_modify(|v| *v += 1);
    }

    /// Notify callbacks after the write lock is released.
    fn finish(&self, changed: bool, op: &'static str) -> bool {
        if changed {
            trace!(kind = %T::KIND, op, version = self.version(), "store changed");
            self.registry.notify();
        }
        changed
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<ResourceId, Arc<T>>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<ResourceId, Arc<T>>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{SocialLink, SocialLinkDraft};
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn link(id: i64, platform: &str) -> SocialLink {
        let draft = SocialLinkDraft {
            platform: platform.into(),
            url: format!("https://{platform}.example"),
            icon: None,
            display_order: 0,
        };
        let mut l = SocialLink::from_draft(ResourceId::Int(id), &draft, Utc::now());
        l.created_at = chrono::DateTime::UNIX_EPOCH;
        l.updated_at = chrono::DateTime::UNIX_EPOCH;
        l
    }

    fn store() -> ResourceStore<SocialLink> {
        ResourceStore::new(SubscriberRegistry::new())
    }

    fn ids(store: &ResourceStore<SocialLink>) -> Vec<ResourceId> {
        store.snapshot().iter().map(|l| l.id.clone()).collect()
    }

    #[test]
    fn upsert_inserts_then_merges() {
        let s = store();
        assert!(s.upsert(link(1, "github")));
        assert!(s.upsert(link(1, "gitlab")));
        assert_eq!(s.len(), 1);
        assert_eq!(s.get(&ResourceId::Int(1)).unwrap().platform, "gitlab");
    }

    #[test]
    fn unchanged_write_keeps_snapshot_pointer() {
        let s = store();
        s.upsert(link(1, "github"));
        let before = s.snapshot();
        let version = s.version();

        assert!(!s.upsert(link(1, "github")));
        assert!(!s.put(link(1, "github")));
        assert!(!s.replace_all(vec![link(1, "github")]));
        assert!(Arc::ptr_eq(&before, &s.snapshot()));
        assert_eq!(s.version(), version);
    }

    #[test]
    fn replace_all_keeps_arcs_of_unchanged_items() {
        let s = store();
        s.replace_all(vec![link(1, "a"), link(2, "b")]);
        let first = s.get(&ResourceId::Int(1)).unwrap();

        assert!(s.replace_all(vec![link(1, "a"), link(3, "c")]));
        assert!(Arc::ptr_eq(&first, &s.get(&ResourceId::Int(1)).unwrap()));
        assert_eq!(ids(&s), vec![ResourceId::Int(1), ResourceId::Int(3)]);
    }

    #[test]
    fn remove_unknown_is_noop() {
        let s = store();
        s.upsert(link(1, "a"));
        let before = s.snapshot();
        assert!(s.remove(&ResourceId::Int(9)).is_none());
        assert!(Arc::ptr_eq(&before, &s.snapshot()));
    }

    #[test]
    fn replace_swaps_temporary_id_in_place() {
        let s = store();
        let tmp = ResourceId::temporary();
        s.upsert(link(1, "a"));
        let mut optimistic = link(0, "b");
        optimistic.id = tmp.clone();
        s.upsert(optimistic);
        s.upsert(link(3, "c"));

        s.replace(&tmp, link(2, "b"));
        assert_eq!(
            ids(&s),
            vec![ResourceId::Int(1), ResourceId::Int(2), ResourceId::Int(3)]
        );
        assert!(!s.contains(&tmp));
    }

    #[test]
    fn replace_drops_duplicate_of_new_id() {
        let s = store();
        let tmp = ResourceId::temporary();
        s.upsert(link(2, "b"));
        let mut optimistic = link(0, "b");
        optimistic.id = tmp.clone();
        s.upsert(optimistic);

        s.replace(&tmp, link(2, "b"));
        assert_eq!(ids(&s), vec![ResourceId::Int(2)]);
    }

    #[test]
    fn notifies_once_per_effective_change() {
        let reg = SubscriberRegistry::new();
        let s: ResourceStore<SocialLink> = ResourceStore::new(Arc::clone(&reg));
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let _sub = reg.subscribe(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        s.upsert(link(1, "a"));
        s.upsert(link(1, "a"));
        s.remove(&ResourceId::Int(7));
        s.clear();
        s.clear();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clear_empties_everything() {
        let s = store();
        s.replace_all(vec![link(1, "a"), link(2, "b")]);
        s.clear();
        assert!(s.is_empty());
        assert!(s.snapshot().is_empty());
    }

    #[tokio::test]
    async fn watch_receiver_sees_changes() {
        let s = store();
        let mut rx = s.subscribe();
        s.upsert(link(1, "a"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);
    }
}
