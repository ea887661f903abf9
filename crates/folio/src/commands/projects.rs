//! Project command handlers.

use std::sync::Arc;

use tabled::Tabled;

use folio_core::{Project, ProjectDraft, ProjectPatch, SyncSession};

use crate::cli::{FromFile, GlobalOpts, IdArg, ProjectFields, ProjectsArgs, ProjectsCommand};
use crate::error::CliError;
use crate::output::{detail_block, or_dash};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Tech")]
    tech: String,
    #[tabled(rename = "Featured")]
    featured: String,
    #[tabled(rename = "Order")]
    order: i32,
}

fn row(p: &Arc<Project>) -> ProjectRow {
    ProjectRow {
        id: p.id.to_string(),
        title: p.title.clone(),
        tech: p.tech_stack.join(", "),
        featured: if p.featured { "yes" } else { "no" }.into(),
        order: p.display_order,
    }
}

fn detail(p: &Project) -> String {
    detail_block(&[
        ("ID", p.id.to_string()),
        ("Title", p.title.clone()),
        ("Description", p.description.clone()),
        ("Tech", p.tech_stack.join(", ")),
        ("Live", or_dash(p.live_url.as_deref())),
        ("Repo", or_dash(p.repo_url.as_deref())),
        ("Image", or_dash(p.image_url.as_deref())),
        ("Featured", p.featured.to_string()),
        ("Order", p.display_order.to_string()),
        ("Updated", p.updated_at.to_rfc3339()),
    ])
}

// ── Payloads ────────────────────────────────────────────────────────

fn draft(file: FromFile, f: ProjectFields) -> Result<ProjectDraft, CliError> {
    if let Some(ref path) = file.from_file {
        return util::read_json_file(path);
    }
    Ok(ProjectDraft {
        title: util::require("title", f.title)?,
        description: f.description.unwrap_or_default(),
        image_url: f.image_url,
        tech_stack: f.tech.unwrap_or_default(),
        live_url: f.live_url,
        repo_url: f.repo_url,
        featured: f.featured.unwrap_or(false),
        display_order: f.order.unwrap_or(0),
    })
}

fn patch(file: FromFile, f: ProjectFields) -> Result<ProjectPatch, CliError> {
    if let Some(ref path) = file.from_file {
        return util::read_json_file(path);
    }
    Ok(ProjectPatch {
        title: f.title,
        description: f.description,
        image_url: f.image_url,
        tech_stack: f.tech,
        live_url: f.live_url,
        repo_url: f.repo_url,
        featured: f.featured,
        display_order: f.order,
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &SyncSession,
    args: ProjectsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let engine = session.projects();
    match args.command {
        ProjectsCommand::List => util::list(engine, global, row).await,
        ProjectsCommand::Show(IdArg { id }) => util::show(engine, &id, global, detail).await,
        ProjectsCommand::Create { file, fields } => {
            util::create(engine, draft(file, fields)?, global, detail).await
        }
        ProjectsCommand::Update { id, file, fields } => {
            util::update(engine, &id, patch(file, fields)?, global, detail).await
        }
        ProjectsCommand::Delete(IdArg { id }) => util::delete(engine, &id, global).await,
    }
}
