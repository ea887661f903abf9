//! Work experience command handlers.

use std::sync::Arc;

use tabled::Tabled;

use folio_core::{SyncSession, WorkExperience, WorkExperienceDraft, WorkExperiencePatch};

use crate::cli::{ExperienceArgs, ExperienceCommand, ExperienceFields, FromFile, GlobalOpts, IdArg};
use crate::error::CliError;
use crate::output::{detail_block, or_dash};

use super::util;

#[derive(Tabled)]
struct ExperienceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Company")]
    company: String,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Period")]
    period: String,
}

fn period(e: &WorkExperience) -> String {
    let end = if e.current {
        "present".to_owned()
    } else {
        e.end_date.map_or_else(|| "?".into(), |d| d.to_string())
    };
    format!("{} to {end}", e.start_date)
}

fn row(e: &Arc<WorkExperience>) -> ExperienceRow {
    ExperienceRow {
        id: e.id.to_string(),
        company: e.company.clone(),
        position: e.position.clone(),
        period: period(e),
    }
}

fn detail(e: &WorkExperience) -> String {
    let mut out = detail_block(&[
        ("ID", e.id.to_string()),
        ("Company", e.company.clone()),
        ("Position", e.position.clone()),
        ("Location", or_dash(e.location.as_deref())),
        ("Period", period(e)),
        ("Description", e.description.clone()),
        ("Order", e.display_order.to_string()),
        ("Updated", e.updated_at.to_rfc3339()),
    ]);
    for h in &e.highlights {
        out.push_str("\n  * ");
        out.push_str(h);
    }
    out
}

fn draft(file: FromFile, f: ExperienceFields) -> Result<WorkExperienceDraft, CliError> {
    if let Some(ref path) = file.from_file {
        return util::read_json_file(path);
    }
    let current = f.current.unwrap_or(false);
    Ok(WorkExperienceDraft {
        company: util::require("company", f.company)?,
        position: util::require("position", f.position)?,
        location: f.location,
        start_date: util::require("start", f.start)?,
        end_date: if current { None } else { f.end },
        current,
        description: f.description.unwrap_or_default(),
        highlights: f.highlights.unwrap_or_default(),
        display_order: f.order.unwrap_or(0),
    })
}

fn patch(file: FromFile, f: ExperienceFields) -> Result<WorkExperiencePatch, CliError> {
    if let Some(ref path) = file.from_file {
        return util::read_json_file(path);
    }
    Ok(WorkExperiencePatch {
        company: f.company,
        position: f.position,
        location: f.location,
        start_date: f.start,
        end_date: f.end,
        current: f.current,
        description: f.description,
        highlights: f.highlights,
        display_order: f.order,
    })
}

pub async fn handle(
    session: &SyncSession,
    args: ExperienceArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let engine = session.work_experience();
    match args.command {
        ExperienceCommand::List => util::list(engine, global, row).await,
        ExperienceCommand::Show(IdArg { id }) => util::show(engine, &id, global, detail).await,
        ExperienceCommand::Create { file, fields } => {
            util::create(engine, draft(file, fields)?, global, detail).await
        }
        ExperienceCommand::Update { id, file, fields } => {
            util::update(engine, &id, patch(file, fields)?, global, detail).await
        }
        ExperienceCommand::Delete(IdArg { id }) => util::delete(engine, &id, global).await,
    }
}
