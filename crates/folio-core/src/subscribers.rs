// ── Change-notification fan-out ──
//
// Mounted consumers register a callback; every effective change to the
// store or fetch state triggers one synchronous `notify()`. The listener
// list is snapshotted before fan-out, so callbacks may subscribe or
// unsubscribe (themselves or others) while a notification is running.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

type Callback = Arc<dyn Fn() + Send + Sync>;

struct Listener {
    id: u64,
    active: AtomicBool,
    callback: Callback,
}

/// Registry of change callbacks for one resource type.
#[derive(Default)]
pub struct SubscriberRegistry {
    listeners: Mutex<Vec<Arc<Listener>>>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `callback`. It stays registered until the returned guard is
    /// unsubscribed or dropped.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let listener = Arc::new(Listener {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            active: AtomicBool::new(true),
            callback: Arc::new(callback),
        });
        self.lock().push(Arc::clone(&listener));
        Subscription {
            registry: Arc::downgrade(self),
            listener: Some(listener),
        }
    }

    /// Invoke every active listener once.
    pub fn notify(&self) {
        let snapshot: Vec<Arc<Listener>> = self.lock().clone();
        for listener in snapshot {
            // Checked per listener: an earlier callback may have removed it.
            if listener.active.load(Ordering::Acquire) {
                (listener.callback)();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn remove(&self, id: u64) {
        self.lock().retain(|l| l.id != id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Arc<Listener>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

/// RAII guard for a registered callback.
///
/// After `unsubscribe()` returns (or the guard is dropped) the callback is
/// never invoked again, even by a notification already in progress.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    registry: Weak<SubscriberRegistry>,
    listener: Option<Arc<Listener>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    pub fn is_active(&self) -> bool {
        self.listener
            .as_ref()
            .is_some_and(|l| l.active.load(Ordering::Acquire))
    }

    fn detach(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        listener.active.store(false, Ordering::Release);
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(listener.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn notify_reaches_every_listener() {
        let reg = SubscriberRegistry::new();
        let (a, fa) = counter();
        let (b, fb) = counter();
        let _sa = reg.subscribe(fa);
        let _sb = reg.subscribe(fb);

        reg.notify();
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn unsubscribe_and_drop_both_detach() {
        let reg = SubscriberRegistry::new();
        let (a, fa) = counter();
        let (b, fb) = counter();
        let sa = reg.subscribe(fa);
        let sb = reg.subscribe(fb);

        sa.unsubscribe();
        drop(sb);
        reg.notify();
        assert_eq!(a.load(Ordering::SeqCst), 0);
        assert_eq!(b.load(Ordering::SeqCst), 0);
        assert!(reg.is_empty());
    }

    #[test]
    fn listener_removed_mid_notification_is_skipped() {
        let reg = SubscriberRegistry::new();
        let victim_slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&victim_slot);
        let _killer = reg.subscribe(move || {
            // Drop the second listener's guard from inside the first callback.
            slot.lock().unwrap().take();
        });
        let (victim_count, victim_fn) = counter();
        *victim_slot.lock().unwrap() = Some(reg.subscribe(victim_fn));

        reg.notify();
        assert_eq!(victim_count.load(Ordering::SeqCst), 0);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn guard_outliving_registry_is_harmless() {
        let reg = SubscriberRegistry::new();
        let (_count, f) = counter();
        let sub = reg.subscribe(f);
        drop(reg);
        assert!(sub.is_active());
        sub.unsubscribe();
    }
}
