// ── Mounted-consumer views ──
//
// What a consumer renders for one resource type is the pair (items,
// status). `ResourceWatch` follows both channels of an engine, the store
// snapshot and the coordinator's fetch state, and yields a fresh
// `ResourceView` whenever either moves.

use std::sync::Arc;

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;

use crate::fetch::FetchState;
use crate::model::Resource;

type Snapshot<T> = Arc<Vec<Arc<T>>>;

/// Load status as a consumer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStatus {
    Idle,
    Loading,
    Ready,
    Error,
}

impl From<FetchState> for HookStatus {
    fn from(state: FetchState) -> Self {
        match state {
            FetchState::Idle => Self::Idle,
            FetchState::InFlight => Self::Loading,
            FetchState::Loaded => Self::Ready,
            FetchState::Failed => Self::Error,
        }
    }
}

/// Items plus load status at one point in time.
///
/// `items` is the store's snapshot `Arc`, so two views with pointer-equal
/// items show the same rows.
#[derive(Debug)]
pub struct ResourceView<T> {
    pub items: Snapshot<T>,
    pub status: HookStatus,
}

impl<T> Clone for ResourceView<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            status: self.status,
        }
    }
}

impl<T> ResourceView<T> {
    pub fn loading(&self) -> bool {
        self.status == HookStatus::Loading
    }

    /// Whether `other` shows the same rows (ignoring status).
    pub fn same_items(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

enum Change<T> {
    Items(Snapshot<T>),
    State(FetchState),
}

/// Async subscription to one engine's view.
pub struct ResourceWatch<T: Resource> {
    current: ResourceView<T>,
    items: watch::Receiver<Snapshot<T>>,
    state: watch::Receiver<FetchState>,
}

impl<T: Resource> ResourceWatch<T> {
    pub(crate) fn new(
        mut items: watch::Receiver<Snapshot<T>>,
        mut state: watch::Receiver<FetchState>,
    ) -> Self {
        let current = ResourceView {
            items: items.borrow_and_update().clone(),
            status: (*state.borrow_and_update()).into(),
        };
        Self {
            current,
            items,
            state,
        }
    }

    /// View as of the last `changed()` (or subscription).
    pub fn current(&self) -> &ResourceView<T> {
        &self.current
    }

    pub fn latest(&self) -> ResourceView<T> {
        ResourceView {
            items: self.items.borrow().clone(),
            status: (*self.state.borrow()).into(),
        }
    }

    /// Wait until items or status change. `None` once the engine is gone.
    pub async fn changed(&mut self) -> Option<ResourceView<T>> {
        let change = tokio::select! {
            res = self.items.changed() => {
                res.ok()?;
                Change::Items(self.items.borrow_and_update().clone())
            }
            res = self.state.changed() => {
                res.ok()?;
                Change::State(*self.state.borrow_and_update())
            }
        };
        apply(&mut self.current, change);
        Some(self.current.clone())
    }

    /// Yields the current view first, then one per change.
    pub fn into_stream(self) -> impl Stream<Item = ResourceView<T>> + Send + Unpin {
        let mut view = self.current;
        let first = tokio_stream::once(view.clone());
        let items = WatchStream::from_changes(self.items).map(Change::Items);
        let state = WatchStream::from_changes(self.state).map(Change::State);
        first.chain(items.merge(state).map(move |change| {
            apply(&mut view, change);
            view.clone()
        }))
    }
}

fn apply<T>(view: &mut ResourceView<T>, change: Change<T>) {
    match change {
        Change::Items(items) => view.items = items,
        Change::State(state) => view.status = state.into(),
    }
}
