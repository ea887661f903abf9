// End-to-end engine behavior against an in-memory remote.
#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use folio_api::{ChangeType, RealtimeMessage};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::Notify;

use folio_core::{
    ApplyOutcome, CoreError, DiscardReason, EngineOptions, ErrorKind, FetchState, HookStatus,
    RemoteSource, Resource, ResourceEngine, ResourceId, SocialLink, SocialLinkDraft,
    SocialLinkPatch, StaticAuthorizer, TechItem, WorkExperience, WorkExperienceDraft,
};

// ── Fake remote ─────────────────────────────────────────────────────

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

/// Table held in memory. Every write stamps a fresh server `updatedAt`.
struct FakeRemote<T: Resource> {
    rows: Mutex<Vec<T>>,
    list_calls: AtomicUsize,
    writes: Mutex<Vec<String>>,
    next_id: AtomicI64,
    clock: AtomicI64,
    fail_next: Mutex<Option<CoreError>>,
    list_gate: Option<Arc<Notify>>,
    write_gate: Option<Arc<Notify>>,
}

impl<T: Resource> FakeRemote<T> {
    fn new(rows: Vec<T>) -> Self {
        Self {
            rows: Mutex::new(rows),
            list_calls: AtomicUsize::new(0),
            writes: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(42),
            clock: AtomicI64::new(100),
            fail_next: Mutex::new(None),
            list_gate: None,
            write_gate: None,
        }
    }

    fn with_list_gate(mut self, gate: &Arc<Notify>) -> Self {
        self.list_gate = Some(Arc::clone(gate));
        self
    }

    fn with_write_gate(mut self, gate: &Arc<Notify>) -> Self {
        self.write_gate = Some(Arc::clone(gate));
        self
    }

    fn fail_next(&self, err: CoreError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    fn stamp(&self, row: &T) -> T {
        let now = ts(self.clock.fetch_add(1, Ordering::SeqCst));
        let mut value = serde_json::to_value(row).unwrap();
        value["updatedAt"] = json!(now.to_rfc3339());
        serde_json::from_value(value).unwrap()
    }

    async fn write_turn(&self, label: String) -> Result<(), CoreError> {
        if let Some(gate) = &self.write_gate {
            gate.notified().await;
        }
        self.writes.lock().unwrap().push(label);
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<T: Resource> RemoteSource<T> for FakeRemote<T> {
    async fn list(&self) -> Result<Vec<T>, CoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.list_gate {
            gate.notified().await;
        }
        if let Some(err) = self.fail_next.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn create(&self, draft: &T::Draft) -> Result<T, CoreError> {
        self.write_turn("create".into()).await?;
        let id = ResourceId::Int(self.next_id.fetch_add(1, Ordering::SeqCst));
        let row = self.stamp(&T::from_draft(id, draft, ts(0)));
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: &ResourceId, patch: &T::Patch) -> Result<T, CoreError> {
        self.write_turn(format!("update {id} {}", serde_json::to_string(patch).unwrap()))
            .await?;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or(CoreError::NotFound {
                kind: T::KIND.to_string(),
                id: id.to_string(),
            })?;
        row.apply_patch(patch);
        *row = self.stamp(row);
        Ok(row.clone())
    }

    async fn delete(&self, id: &ResourceId) -> Result<(), CoreError> {
        self.write_turn(format!("delete {id}")).await?;
        self.rows.lock().unwrap().retain(|r| r.id() != id);
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn engine<T: Resource>(remote: &Arc<FakeRemote<T>>, admin: bool) -> ResourceEngine<T> {
    ResourceEngine::new(
        Arc::clone(remote) as Arc<dyn RemoteSource<T>>,
        Arc::new(StaticAuthorizer::new(admin)),
        EngineOptions::default(),
    )
}

fn tech(id: i64, name: &str) -> TechItem {
    serde_json::from_value(json!({
        "id": id,
        "name": name,
        "createdAt": ts(0).to_rfc3339(),
        "updatedAt": ts(1).to_rfc3339(),
    }))
    .unwrap()
}

fn link(id: i64, platform: &str, updated: i64) -> SocialLink {
    serde_json::from_value(link_row(id, platform, updated)).unwrap()
}

fn link_row(id: i64, platform: &str, updated: i64) -> serde_json::Value {
    json!({
        "id": id,
        "platform": platform,
        "url": format!("https://{platform}.example"),
        "createdAt": ts(0).to_rfc3339(),
        "updatedAt": ts(updated).to_rfc3339(),
    })
}

fn message(change: ChangeType, table: &str, new: Option<serde_json::Value>) -> RealtimeMessage {
    RealtimeMessage {
        event_type: change,
        table: table.into(),
        old_record: new.as_ref().map(|r| json!({ "id": r["id"] })),
        new_record: new,
        commit_timestamp: None,
    }
}

fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    (count, move || {
        c.fetch_add(1, Ordering::SeqCst);
    })
}

async fn wait_for<F: Fn() -> bool>(cond: F) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn first_mount_loads_collection_exactly() {
    let remote = Arc::new(FakeRemote::new(vec![tech(1, "A")]));
    let engine = engine(&remote, false);

    let handle = engine.mount(|| {}).await;

    assert_eq!(handle.status(), HookStatus::Ready);
    let data = handle.data();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].id, ResourceId::Int(1));
    assert_eq!(data[0].name, "A");
}

#[tokio::test]
async fn simultaneous_mounts_share_one_fetch() {
    let gate = Arc::new(Notify::new());
    let remote = Arc::new(FakeRemote::new(vec![tech(1, "A")]).with_list_gate(&gate));
    let engine = engine(&remote, false);

    let first = tokio::spawn({
        let engine = engine.clone();
        async move { engine.mount(|| {}).await }
    });
    let second = tokio::spawn({
        let engine = engine.clone();
        async move { engine.mount(|| {}).await }
    });

    wait_for(|| engine.status() == HookStatus::Loading).await;
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    gate.notify_one();

    let (a, b) = (first.await.unwrap(), second.await.unwrap());
    assert_eq!(remote.list_calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&a.data(), &b.data()));
    assert_eq!(a.data().len(), 1);
}

#[tokio::test]
async fn create_promotes_temporary_id_to_server_id() {
    let gate = Arc::new(Notify::new());
    let remote = Arc::new(FakeRemote::<WorkExperience>::new(vec![]).with_write_gate(&gate));
    let engine = engine(&remote, true);
    let handle = engine.mount(|| {}).await;

    let draft = WorkExperienceDraft {
        company: "Acme".into(),
        position: "Dev".into(),
        location: None,
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end_date: None,
        current: true,
        description: String::new(),
        highlights: vec![],
        display_order: 0,
    };
    let pending = tokio::spawn({
        let engine = engine.clone();
        async move { engine.mutator().create(draft).await }
    });

    wait_for(|| !engine.snapshot().is_empty()).await;
    let optimistic = handle.data();
    assert_eq!(optimistic.len(), 1);
    assert!(optimistic[0].id.is_temporary());
    assert_eq!(optimistic[0].position, "Dev");

    gate.notify_one();
    let created = pending.await.unwrap().unwrap();
    assert_eq!(created.id, ResourceId::Int(42));

    let data = handle.data();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].id, ResourceId::Int(42));
    assert!(engine.mutator().pending().is_empty());
}

// ── Rollback ────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_update_restores_snapshot_exactly() {
    let remote = Arc::new(FakeRemote::new(vec![link(1, "github", 1), link(2, "mastodon", 1)]));
    let engine = engine(&remote, true);
    let handle = engine.mount(|| {}).await;
    let before: Vec<SocialLink> = handle.data().iter().map(|l| (**l).clone()).collect();

    remote.fail_next(CoreError::Validation {
        message: "url invalid".into(),
    });
    let err = handle
        .update(
            &ResourceId::Int(1),
            SocialLinkPatch {
                url: Some("nope".into()),
                ..SocialLinkPatch::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    let after: Vec<SocialLink> = handle.data().iter().map(|l| (**l).clone()).collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn failed_delete_restores_item_in_place() {
    let remote = Arc::new(FakeRemote::new(vec![
        link(1, "a", 1),
        link(2, "b", 1),
        link(3, "c", 1),
    ]));
    let engine = engine(&remote, true);
    let handle = engine.mount(|| {}).await;

    remote.fail_next(CoreError::Network {
        message: "offline".into(),
    });
    let err = handle.remove(&ResourceId::Int(2)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);

    let ids: Vec<ResourceId> = handle.data().iter().map(|l| l.id.clone()).collect();
    assert_eq!(ids, vec![ResourceId::Int(1), ResourceId::Int(2), ResourceId::Int(3)]);
}

#[tokio::test]
async fn failed_create_removes_optimistic_row() {
    let remote = Arc::new(FakeRemote::<SocialLink>::new(vec![]));
    let engine = engine(&remote, true);
    let handle = engine.mount(|| {}).await;

    remote.fail_next(CoreError::Conflict {
        message: "duplicate platform".into(),
    });
    let draft = SocialLinkDraft {
        platform: "github".into(),
        url: "https://github.com/me".into(),
        icon: None,
        display_order: 0,
    };
    let err = handle.create(draft).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(handle.data().is_empty());
}

#[tokio::test]
async fn remove_unknown_id_is_not_found_without_store_change() {
    let remote = Arc::new(FakeRemote::new(vec![link(1, "a", 1)]));
    let engine = engine(&remote, true);
    let handle = engine.mount(|| {}).await;
    let before = handle.data();

    let err = handle.remove(&ResourceId::Int(99)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(Arc::ptr_eq(&before, &handle.data()));
    assert!(remote.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn non_admin_mutation_fails_before_local_change() {
    let remote = Arc::new(FakeRemote::new(vec![link(1, "a", 1)]));
    let engine = engine(&remote, false);
    let handle = engine.mount(|| {}).await;
    let before = handle.data();

    let err = handle.remove(&ResourceId::Int(1)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(Arc::ptr_eq(&before, &handle.data()));
    assert!(remote.writes.lock().unwrap().is_empty());
}

// ── Queueing ────────────────────────────────────────────────────────

#[tokio::test]
async fn mutations_on_same_id_are_queued() {
    let gate = Arc::new(Notify::new());
    let remote = Arc::new(FakeRemote::new(vec![link(1, "a", 1)]).with_write_gate(&gate));
    let engine = engine(&remote, true);
    let _handle = engine.mount(|| {}).await;

    let patch = |platform: &str| SocialLinkPatch {
        platform: Some(platform.into()),
        ..SocialLinkPatch::default()
    };
    let first = tokio::spawn({
        let engine = engine.clone();
        let p = patch("first");
        async move { engine.mutator().update(&ResourceId::Int(1), p).await }
    });
    wait_for(|| engine.get(&ResourceId::Int(1)).unwrap().platform == "first").await;

    let second = tokio::spawn({
        let engine = engine.clone();
        let p = patch("second");
        async move { engine.mutator().update(&ResourceId::Int(1), p).await }
    });
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    // Second is queued: its optimistic value must not show yet.
    assert_eq!(engine.get(&ResourceId::Int(1)).unwrap().platform, "first");

    gate.notify_one();
    first.await.unwrap().unwrap();
    gate.notify_one();
    second.await.unwrap().unwrap();

    let writes = remote.writes.lock().unwrap().clone();
    assert_eq!(writes.len(), 2);
    assert!(writes[0].contains("first"));
    assert!(writes[1].contains("second"));
    assert_eq!(engine.get(&ResourceId::Int(1)).unwrap().platform, "second");
}

#[tokio::test]
async fn mutations_addressed_to_a_temporary_id_follow_the_create() {
    let gate = Arc::new(Notify::new());
    let remote = Arc::new(FakeRemote::<SocialLink>::new(vec![]).with_write_gate(&gate));
    let engine = engine(&remote, true);
    let _handle = engine.mount(|| {}).await;

    let create = tokio::spawn({
        let engine = engine.clone();
        let draft = SocialLinkDraft {
            platform: "github".into(),
            url: "https://github.com/folio".into(),
            icon: None,
            display_order: 0,
        };
        async move { engine.mutator().create(draft).await }
    });
    wait_for(|| !engine.snapshot().is_empty()).await;
    let temp = engine.snapshot()[0].id.clone();
    assert!(temp.is_temporary());

    // Issued against the id the consumer saw, while the create is in flight.
    let update = tokio::spawn({
        let engine = engine.clone();
        let temp = temp.clone();
        let patch = SocialLinkPatch {
            platform: Some("codeberg".into()),
            ..SocialLinkPatch::default()
        };
        async move { engine.mutator().update(&temp, patch).await }
    });
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    assert_eq!(remote.writes.lock().unwrap().len(), 0);

    gate.notify_one();
    assert_eq!(create.await.unwrap().unwrap().id, ResourceId::Int(42));
    gate.notify_one();
    let updated = update.await.unwrap().unwrap();
    assert_eq!(updated.id, ResourceId::Int(42));
    assert_eq!(updated.platform, "codeberg");

    gate.notify_one();
    engine.mutator().remove(&temp).await.unwrap();

    let writes = remote.writes.lock().unwrap().clone();
    assert_eq!(writes[0], "create");
    assert!(writes[1].starts_with("update 42 "));
    assert_eq!(writes[2], "delete 42");
    assert!(engine.snapshot().is_empty());
    assert!(engine.mutator().pending().is_empty());
}

// ── Realtime ────────────────────────────────────────────────────────

#[tokio::test]
async fn echo_of_pending_create_is_absorbed() {
    let gate = Arc::new(Notify::new());
    let remote = Arc::new(FakeRemote::<SocialLink>::new(vec![]).with_write_gate(&gate));
    let engine = engine(&remote, true);
    let handle = engine.mount(|| {}).await;

    let draft = SocialLinkDraft {
        platform: "github".into(),
        url: "https://github.example".into(),
        icon: None,
        display_order: 0,
    };
    let pending = tokio::spawn({
        let engine = engine.clone();
        async move { engine.mutator().create(draft).await }
    });
    wait_for(|| !engine.snapshot().is_empty()).await;

    // The server row arrives over realtime before the HTTP response.
    let echo = message(ChangeType::Insert, "social_links", Some(link_row(42, "github", 100)));
    assert_eq!(engine.on_message(&echo), Some(ApplyOutcome::Held));
    assert_eq!(handle.data().len(), 1);

    gate.notify_one();
    pending.await.unwrap().unwrap();

    let data = handle.data();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].id, ResourceId::Int(42));
    // A late duplicate is recognized as our own write.
    assert_eq!(
        engine.on_message(&echo),
        Some(ApplyOutcome::Discarded(DiscardReason::Echo))
    );
}

#[tokio::test]
async fn concurrent_remote_edit_wins_by_server_time() {
    let gate = Arc::new(Notify::new());
    let remote = Arc::new(FakeRemote::new(vec![link(1, "a", 1)]).with_write_gate(&gate));
    let engine = engine(&remote, true);
    let _handle = engine.mount(|| {}).await;

    let pending = tokio::spawn({
        let engine = engine.clone();
        async move {
            engine
                .mutator()
                .update(
                    &ResourceId::Int(1),
                    SocialLinkPatch {
                        platform: Some("mine".into()),
                        ..SocialLinkPatch::default()
                    },
                )
                .await
        }
    });
    wait_for(|| engine.get(&ResourceId::Int(1)).unwrap().platform == "mine").await;

    // Another admin saved later than our write will be stamped (t=100).
    let theirs = message(ChangeType::Update, "social_links", Some(link_row(1, "theirs", 500)));
    assert_eq!(engine.on_message(&theirs), Some(ApplyOutcome::Held));
    // Flicker-free: the optimistic value stays while we wait.
    assert_eq!(engine.get(&ResourceId::Int(1)).unwrap().platform, "mine");

    gate.notify_one();
    pending.await.unwrap().unwrap();
    assert_eq!(engine.get(&ResourceId::Int(1)).unwrap().platform, "theirs");
}

#[tokio::test]
async fn stale_remote_edit_is_discarded_after_confirmation() {
    let gate = Arc::new(Notify::new());
    let remote = Arc::new(FakeRemote::new(vec![link(1, "a", 1)]).with_write_gate(&gate));
    let engine = engine(&remote, true);
    let _handle = engine.mount(|| {}).await;

    let pending = tokio::spawn({
        let engine = engine.clone();
        async move {
            engine
                .mutator()
                .update(
                    &ResourceId::Int(1),
                    SocialLinkPatch {
                        platform: Some("mine".into()),
                        ..SocialLinkPatch::default()
                    },
                )
                .await
        }
    });
    wait_for(|| engine.get(&ResourceId::Int(1)).unwrap().platform == "mine").await;

    let older = message(ChangeType::Update, "social_links", Some(link_row(1, "older", 50)));
    assert_eq!(engine.on_message(&older), Some(ApplyOutcome::Held));

    gate.notify_one();
    pending.await.unwrap().unwrap();
    assert_eq!(engine.get(&ResourceId::Int(1)).unwrap().platform, "mine");
}

#[tokio::test]
async fn realtime_application_is_idempotent() {
    let remote = Arc::new(FakeRemote::new(vec![link(1, "a", 1)]));
    let engine = engine(&remote, false);
    let _handle = engine.mount(|| {}).await;

    let events = [
        message(ChangeType::Insert, "social_links", Some(link_row(2, "b", 5))),
        message(ChangeType::Update, "social_links", Some(link_row(1, "a2", 6))),
        message(ChangeType::Delete, "social_links", Some(link_row(2, "b", 7))),
    ];
    for e in &events {
        engine.on_message(e);
    }
    let once: Vec<SocialLink> = engine.snapshot().iter().map(|l| (**l).clone()).collect();
    for e in &events {
        engine.on_message(e);
    }
    let twice: Vec<SocialLink> = engine.snapshot().iter().map(|l| (**l).clone()).collect();
    assert_eq!(once, twice);
    assert_eq!(once.len(), 1);
    assert_eq!(once[0].platform, "a2");
}

// ── Listener lifecycle ──────────────────────────────────────────────

#[tokio::test]
async fn listener_sees_exactly_one_notification() {
    let remote = Arc::new(FakeRemote::<SocialLink>::new(vec![]));
    let engine = engine(&remote, false);
    let (count, callback) = counter();

    let subscription = engine.subscribers().subscribe(callback);
    engine.on_message(&message(ChangeType::Insert, "social_links", Some(link_row(1, "a", 1))));
    subscription.unsubscribe();
    engine.on_message(&message(ChangeType::Insert, "social_links", Some(link_row(2, "b", 1))));

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(engine.snapshot().len(), 2);
}

#[tokio::test]
async fn unmounted_handle_is_never_called() {
    let remote = Arc::new(FakeRemote::new(vec![link(1, "a", 1)]));
    let engine = engine(&remote, false);
    let (count, callback) = counter();

    let handle = engine.mount(callback).await;
    assert!(handle.is_mounted());
    let seen = count.load(Ordering::SeqCst);
    assert!(seen > 0);

    handle.unmount();
    engine.on_message(&message(ChangeType::Insert, "social_links", Some(link_row(2, "b", 1))));
    engine.ensure_loaded(true).await.unwrap();
    assert_eq!(count.load(Ordering::SeqCst), seen);
}

#[tokio::test]
async fn unmount_during_load_leaves_other_mounts_served() {
    let gate = Arc::new(Notify::new());
    let remote = Arc::new(FakeRemote::new(vec![link(1, "a", 1)]).with_list_gate(&gate));
    let engine = engine(&remote, false);
    let (gone_count, gone_callback) = counter();
    let (kept_count, kept_callback) = counter();

    let gone = tokio::spawn({
        let engine = engine.clone();
        async move { engine.mount(gone_callback).await }
    });
    let kept = tokio::spawn({
        let engine = engine.clone();
        async move { engine.mount(kept_callback).await }
    });
    wait_for(|| engine.status() == HookStatus::Loading).await;
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }

    // Dropping the pending mount unmounts it.
    gone.abort();
    assert!(gone.await.unwrap_err().is_cancelled());
    let seen = gone_count.load(Ordering::SeqCst);
    let before = kept_count.load(Ordering::SeqCst);

    gate.notify_one();
    let handle = kept.await.unwrap();
    assert_eq!(handle.status(), HookStatus::Ready);
    assert_eq!(handle.data().len(), 1);
    assert_eq!(remote.list_calls.load(Ordering::SeqCst), 1);
    assert!(kept_count.load(Ordering::SeqCst) > before);

    engine.on_message(&message(ChangeType::Insert, "social_links", Some(link_row(2, "b", 2))));
    assert_eq!(gone_count.load(Ordering::SeqCst), seen);
    assert_eq!(engine.subscribers().len(), 1);
}

// ── Load failures ───────────────────────────────────────────────────

#[tokio::test]
async fn failed_refetch_keeps_data_and_reports_error() {
    let remote = Arc::new(FakeRemote::new(vec![link(1, "a", 1)]));
    let engine = engine(&remote, false);
    let handle = engine.mount(|| {}).await;

    remote.fail_next(CoreError::Unauthorized {
        message: "token expired".into(),
    });
    let err = handle.refetch().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(handle.status(), HookStatus::Error);
    assert_eq!(handle.error().map(|e| e.kind()), Some(ErrorKind::Auth));
    assert_eq!(handle.data().len(), 1);

    handle.refetch().await.unwrap();
    assert_eq!(handle.status(), HookStatus::Ready);
    assert!(handle.error().is_none());
}

#[tokio::test]
async fn reset_clears_cache_and_returns_to_idle() {
    let remote = Arc::new(FakeRemote::new(vec![link(1, "a", 1)]));
    let engine = engine(&remote, false);
    let _handle = engine.mount(|| {}).await;

    engine.reset();
    assert!(engine.snapshot().is_empty());
    assert_eq!(engine.coordinator().state(), FetchState::Idle);

    engine.ensure_loaded(false).await.unwrap();
    assert_eq!(remote.list_calls.load(Ordering::SeqCst), 2);
}
