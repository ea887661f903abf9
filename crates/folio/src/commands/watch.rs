//! `folio watch`: stream collection changes to stdout until Ctrl-C.
//!
//! Each watched collection gets a task following its `ResourceWatch`. Row
//! changes become one record per change on stdout; load status and
//! connection state go to stderr.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use folio_core::{HookStatus, Resource, ResourceEngine, ResourceId, ResourceView, SyncSession};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs, WatchKind};
use crate::error::CliError;
use crate::output;

/// Ids touched between two snapshots of one collection.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
struct ChangeSet {
    kind: &'static str,
    added: Vec<String>,
    updated: Vec<String>,
    removed: Vec<String>,
    total: usize,
}

impl ChangeSet {
    fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// One record per change set. JSON stays on one line; YAML records are
    /// separate documents.
    fn render(&self, format: &OutputFormat, color: bool) -> Result<String, CliError> {
        Ok(match format {
            OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(self)?,
            OutputFormat::Yaml => format!("---\n{}", serde_yaml::to_string(self)?.trim_end()),
            OutputFormat::Table | OutputFormat::Plain => {
                let mut parts = vec![format!("[{}]", self.kind)];
                for (marker, ids) in [('+', &self.added), ('~', &self.updated), ('-', &self.removed)] {
                    for id in ids {
                        parts.push(format!("{}{id}", output::paint_marker(marker, color)));
                    }
                }
                parts.push(format!("({} total)", self.total));
                parts.join(" ")
            }
        })
    }
}

fn diff<T: Resource>(before: &[Arc<T>], after: &[Arc<T>]) -> ChangeSet {
    let old: HashMap<&ResourceId, &Arc<T>> = before.iter().map(|t| (t.id(), t)).collect();
    let mut set = ChangeSet {
        kind: T::KIND.table(),
        total: after.len(),
        ..ChangeSet::default()
    };

    for item in after {
        match old.get(item.id()) {
            None => set.added.push(item.id().to_string()),
            Some(prev) if !Arc::ptr_eq(prev, item) && ***prev != **item => {
                set.updated.push(item.id().to_string());
            }
            Some(_) => {}
        }
    }
    let new: HashMap<&ResourceId, ()> = after.iter().map(|t| (t.id(), ())).collect();
    set.removed = before
        .iter()
        .filter(|t| !new.contains_key(t.id()))
        .map(|t| t.id().to_string())
        .collect();
    set
}

/// What a watch task reports to the printing loop.
enum Event {
    Rows(String),
    Status(&'static str, HookStatus),
}

/// Requested kinds in first-mention order, each once; all kinds when none
/// were named.
fn selected_kinds(requested: Vec<WatchKind>) -> Vec<WatchKind> {
    if requested.is_empty() {
        return vec![
            WatchKind::Projects,
            WatchKind::Tech,
            WatchKind::Socials,
            WatchKind::Experience,
        ];
    }
    let mut kinds = Vec::with_capacity(requested.len());
    for kind in requested {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    kinds
}

/// `false` once the printing loop is gone.
fn send_rows(
    tx: &mpsc::UnboundedSender<Event>,
    changes: &ChangeSet,
    format: &OutputFormat,
    color: bool,
) -> bool {
    match changes.render(format, color) {
        Ok(line) => tx.send(Event::Rows(line)).is_ok(),
        Err(e) => {
            tracing::warn!(kind = changes.kind, error = %e, "could not render change set");
            true
        }
    }
}

async fn spawn_watch<T: Resource>(
    tasks: &mut JoinSet<()>,
    engine: &ResourceEngine<T>,
    tx: mpsc::UnboundedSender<Event>,
    format: OutputFormat,
    color: bool,
) -> Result<(), CliError> {
    engine.ensure_loaded(false).await?;
    let mut watch = engine.watch();
    let mut previous: ResourceView<T> = watch.current().clone();
    send_rows(&tx, &diff::<T>(&[], &previous.items), &format, color);

    tasks.spawn(async move {
        while let Some(view) = watch.changed().await {
            if view.status != previous.status
                && tx.send(Event::Status(T::KIND.table(), view.status)).is_err()
            {
                break;
            }
            if !view.same_items(&previous) {
                let changes = diff(&previous.items, &view.items);
                if !changes.is_empty() && !send_rows(&tx, &changes, &format, color) {
                    break;
                }
            }
            previous = view;
        }
    });
    Ok(())
}

/// Runs until every watch ends; the caller stops it on Ctrl-C.
pub async fn handle(
    session: &SyncSession,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut tasks = JoinSet::new();
    for kind in selected_kinds(args.kind) {
        let format = global.output.clone();
        let tx = tx.clone();
        match kind {
            WatchKind::Projects => {
                spawn_watch(&mut tasks, session.projects(), tx, format, color).await?;
            }
            WatchKind::Tech => {
                spawn_watch(&mut tasks, session.tech_stack(), tx, format, color).await?;
            }
            WatchKind::Socials => {
                spawn_watch(&mut tasks, session.social_links(), tx, format, color).await?;
            }
            WatchKind::Experience => {
                spawn_watch(&mut tasks, session.work_experience(), tx, format, color).await?;
            }
        }
    }
    drop(tx);

    session.connect().await?;
    let mut state = session.connection_state();
    if !global.quiet {
        eprintln!("watching for changes (Ctrl-C to stop)");
    }

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(Event::Rows(line)) => output::print_output(&line, global.quiet),
                Some(Event::Status(kind, status)) => {
                    tracing::info!(kind, ?status, "load status");
                    if !global.quiet && status == HookStatus::Error {
                        eprintln!("{kind}: reload failed, showing cached rows");
                    }
                }
                None => break,
            },
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = state.borrow_and_update().clone();
                tracing::info!(state = ?current, "realtime connection");
                if !global.quiet {
                    eprintln!("realtime: {current:?}");
                }
            }
        }
    }

    tasks.shutdown().await;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use folio_core::TechItem;

    fn tech(id: i64, name: &str) -> Arc<TechItem> {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Arc::new(TechItem {
            id: ResourceId::Int(id),
            name: name.into(),
            category: "language".into(),
            icon_url: None,
            proficiency: None,
            display_order: 0,
            created_at: at,
            updated_at: at,
        })
    }

    #[test]
    fn diff_reports_added_updated_removed() {
        let keep = tech(1, "Rust");
        let before = vec![Arc::clone(&keep), tech(2, "Go"), tech(3, "Zig")];
        let after = vec![keep, tech(2, "Golang"), tech(4, "Elixir")];

        let set = diff(&before, &after);
        assert_eq!(set.added, vec!["4"]);
        assert_eq!(set.updated, vec!["2"]);
        assert_eq!(set.removed, vec!["3"]);
        assert_eq!(set.total, 3);
        assert_eq!(set.kind, "tech_stack");
    }

    #[test]
    fn equal_rows_behind_new_arcs_are_not_updates() {
        let set = diff(&[tech(1, "Rust")], &[tech(1, "Rust")]);
        assert!(set.is_empty());
    }

    #[test]
    fn plain_render_lists_markers() {
        let set = diff(&[tech(3, "Zig")], &[tech(4, "Elixir")]);
        assert_eq!(
            set.render(&OutputFormat::Plain, false).unwrap(),
            "[tech_stack] +4 -3 (1 total)"
        );
    }

    #[test]
    fn yaml_render_is_a_yaml_document() {
        let set = diff(&[tech(3, "Zig")], &[tech(4, "Elixir")]);
        let rendered = set.render(&OutputFormat::Yaml, false).unwrap();
        assert!(rendered.starts_with("---\nkind: tech_stack\n"), "{rendered}");
        assert!(!rendered.contains('{'));

        let body = rendered.trim_start_matches("---\n");
        let parsed: serde_yaml::Value = serde_yaml::from_str(body).unwrap();
        assert_eq!(parsed["added"][0].as_str(), Some("4"));
        assert_eq!(parsed["total"].as_u64(), Some(1));
    }

    #[test]
    fn json_render_stays_on_one_line() {
        let set = diff(&[], &[tech(1, "Rust"), tech(2, "Go")]);
        let rendered = set.render(&OutputFormat::Json, false).unwrap();
        assert!(!rendered.contains('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["added"], serde_json::json!(["1", "2"]));
    }

    #[test]
    fn repeated_kinds_are_watched_once() {
        let kinds = selected_kinds(vec![
            WatchKind::Tech,
            WatchKind::Projects,
            WatchKind::Tech,
            WatchKind::Projects,
        ]);
        assert_eq!(kinds, vec![WatchKind::Tech, WatchKind::Projects]);
        assert_eq!(selected_kinds(Vec::new()).len(), 4);
    }
}
