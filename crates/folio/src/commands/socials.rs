//! Social link command handlers.

use std::sync::Arc;

use tabled::Tabled;

use folio_core::{SocialLink, SocialLinkDraft, SocialLinkPatch, SyncSession};

use crate::cli::{FromFile, GlobalOpts, IdArg, SocialFields, SocialsArgs, SocialsCommand};
use crate::error::CliError;
use crate::output::{detail_block, or_dash};

use super::util;

#[derive(Tabled)]
struct SocialRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Platform")]
    platform: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Order")]
    order: i32,
}

fn row(s: &Arc<SocialLink>) -> SocialRow {
    SocialRow {
        id: s.id.to_string(),
        platform: s.platform.clone(),
        url: s.url.clone(),
        order: s.display_order,
    }
}

fn detail(s: &SocialLink) -> String {
    detail_block(&[
        ("ID", s.id.to_string()),
        ("Platform", s.platform.clone()),
        ("URL", s.url.clone()),
        ("Icon", or_dash(s.icon.as_deref())),
        ("Order", s.display_order.to_string()),
        ("Updated", s.updated_at.to_rfc3339()),
    ])
}

fn draft(file: FromFile, f: SocialFields) -> Result<SocialLinkDraft, CliError> {
    if let Some(ref path) = file.from_file {
        return util::read_json_file(path);
    }
    Ok(SocialLinkDraft {
        platform: util::require("platform", f.platform)?,
        url: util::require("url", f.url)?,
        icon: f.icon,
        display_order: f.order.unwrap_or(0),
    })
}

fn patch(file: FromFile, f: SocialFields) -> Result<SocialLinkPatch, CliError> {
    if let Some(ref path) = file.from_file {
        return util::read_json_file(path);
    }
    Ok(SocialLinkPatch {
        platform: f.platform,
        url: f.url,
        icon: f.icon,
        display_order: f.order,
    })
}

pub async fn handle(
    session: &SyncSession,
    args: SocialsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let engine = session.social_links();
    match args.command {
        SocialsCommand::List => util::list(engine, global, row).await,
        SocialsCommand::Show(IdArg { id }) => util::show(engine, &id, global, detail).await,
        SocialsCommand::Create { file, fields } => {
            util::create(engine, draft(file, fields)?, global, detail).await
        }
        SocialsCommand::Update { id, file, fields } => {
            util::update(engine, &id, patch(file, fields)?, global, detail).await
        }
        SocialsCommand::Delete(IdArg { id }) => util::delete(engine, &id, global).await,
    }
}
