//! Shared helpers for command handlers.
//!
//! The CRUD helpers are generic over the resource type; each resource
//! module only supplies its table row, detail view, and draft/patch
//! construction.

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tabled::Tabled;

use folio_core::{Resource, ResourceEngine, ResourceId};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Refuses rather than blocking when stdin is not a terminal.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    Ok(dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()?)
}

/// Read and parse a JSON payload for `--from-file`.
pub fn read_json_file<D: DeserializeOwned>(path: &Path) -> Result<D, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid payload in {}: {e}", path.display()),
    })
}

/// Unwrap a flag that a create needs.
pub fn require<V>(field: &str, value: Option<V>) -> Result<V, CliError> {
    value.ok_or_else(|| CliError::Validation {
        field: field.into(),
        reason: format!("--{field} is required (or pass --from-file)"),
    })
}

fn id_of<T: Resource>(item: &T) -> String {
    item.id().to_string()
}

// ── Generic CRUD ─────────────────────────────────────────────────────

pub async fn list<T, R>(
    engine: &ResourceEngine<T>,
    global: &GlobalOpts,
    to_row: impl Fn(&Arc<T>) -> R,
) -> Result<(), CliError>
where
    T: Resource,
    R: Tabled,
{
    engine.ensure_loaded(false).await?;
    let snap = engine.snapshot();
    let out = output::render_list(&global.output, snap.as_slice(), to_row, |t| id_of(&**t))?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn show<T: Resource>(
    engine: &ResourceEngine<T>,
    id: &str,
    global: &GlobalOpts,
    detail: impl Fn(&T) -> String,
) -> Result<(), CliError> {
    engine.ensure_loaded(false).await?;
    let id = ResourceId::from(id);
    let Some(item) = engine.get(&id) else {
        return Err(not_found::<T>(&id));
    };
    let out = output::render_single(&global.output, &*item, detail, id_of::<T>)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn create<T: Resource>(
    engine: &ResourceEngine<T>,
    draft: T::Draft,
    global: &GlobalOpts,
    detail: impl Fn(&T) -> String,
) -> Result<(), CliError> {
    let created = engine.mutator().create(draft).await?;
    let out = output::render_single(&global.output, &*created, detail, id_of::<T>)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn update<T: Resource>(
    engine: &ResourceEngine<T>,
    id: &str,
    patch: T::Patch,
    global: &GlobalOpts,
    detail: impl Fn(&T) -> String,
) -> Result<(), CliError> {
    let empty = serde_json::to_value(&patch)?
        .as_object()
        .is_some_and(serde_json::Map::is_empty);
    if empty {
        return Err(CliError::Validation {
            field: "update".into(),
            reason: "no fields given; pass at least one field flag or --from-file".into(),
        });
    }

    engine.ensure_loaded(false).await?;
    let updated = engine
        .mutator()
        .update(&ResourceId::from(id), patch)
        .await?;
    let out = output::render_single(&global.output, &*updated, detail, id_of::<T>)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn delete<T: Resource>(
    engine: &ResourceEngine<T>,
    id: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let table = T::KIND.table();
    let action = format!("delete {table} {id}");
    if !confirm(&format!("Delete {table} '{id}'?"), &action, global.yes)? {
        return Ok(());
    }

    engine.ensure_loaded(false).await?;
    engine.mutator().remove(&ResourceId::from(id)).await?;
    if !global.quiet {
        eprintln!("Deleted {table} '{id}'");
    }
    Ok(())
}

fn not_found<T: Resource>(id: &ResourceId) -> CliError {
    CliError::NotFound {
        resource_type: T::KIND.table().into(),
        identifier: id.to_string(),
        list_command: crate::error::list_command(T::KIND).into(),
    }
}
