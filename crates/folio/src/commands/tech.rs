//! Tech stack command handlers.

use std::sync::Arc;

use tabled::Tabled;

use folio_core::{SyncSession, TechItem, TechItemDraft, TechItemPatch};

use crate::cli::{FromFile, GlobalOpts, IdArg, TechArgs, TechCommand, TechFields};
use crate::error::CliError;
use crate::output::{detail_block, or_dash};

use super::util;

#[derive(Tabled)]
struct TechRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Proficiency")]
    proficiency: String,
    #[tabled(rename = "Order")]
    order: i32,
}

fn row(t: &Arc<TechItem>) -> TechRow {
    TechRow {
        id: t.id.to_string(),
        name: t.name.clone(),
        category: t.category.clone(),
        proficiency: t.proficiency.map(|p| format!("{p}%")).unwrap_or_default(),
        order: t.display_order,
    }
}

fn detail(t: &TechItem) -> String {
    detail_block(&[
        ("ID", t.id.to_string()),
        ("Name", t.name.clone()),
        ("Category", t.category.clone()),
        ("Icon", or_dash(t.icon_url.as_deref())),
        (
            "Proficiency",
            t.proficiency.map_or_else(|| "-".into(), |p| format!("{p}%")),
        ),
        ("Order", t.display_order.to_string()),
        ("Updated", t.updated_at.to_rfc3339()),
    ])
}

fn draft(file: FromFile, f: TechFields) -> Result<TechItemDraft, CliError> {
    if let Some(ref path) = file.from_file {
        return util::read_json_file(path);
    }
    Ok(TechItemDraft {
        name: util::require("name", f.name)?,
        category: f.category.unwrap_or_default(),
        icon_url: f.icon_url,
        proficiency: f.proficiency,
        display_order: f.order.unwrap_or(0),
    })
}

fn patch(file: FromFile, f: TechFields) -> Result<TechItemPatch, CliError> {
    if let Some(ref path) = file.from_file {
        return util::read_json_file(path);
    }
    Ok(TechItemPatch {
        name: f.name,
        category: f.category,
        icon_url: f.icon_url,
        proficiency: f.proficiency,
        display_order: f.order,
    })
}

pub async fn handle(
    session: &SyncSession,
    args: TechArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let engine = session.tech_stack();
    match args.command {
        TechCommand::List => util::list(engine, global, row).await,
        TechCommand::Show(IdArg { id }) => util::show(engine, &id, global, detail).await,
        TechCommand::Create { file, fields } => {
            util::create(engine, draft(file, fields)?, global, detail).await
        }
        TechCommand::Update { id, file, fields } => {
            util::update(engine, &id, patch(file, fields)?, global, detail).await
        }
        TechCommand::Delete(IdArg { id }) => util::delete(engine, &id, global).await,
    }
}
