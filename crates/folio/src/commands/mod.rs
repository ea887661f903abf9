//! Command dispatch: bridges CLI args -> engine operations -> output formatting.

pub mod config_cmd;
pub mod experience;
pub mod projects;
pub mod socials;
pub mod tech;
pub mod util;
pub mod watch;

use folio_core::SyncSession;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a session-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    session: &SyncSession,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Projects(args) => projects::handle(session, args, global).await,
        Command::Tech(args) => tech::handle(session, args, global).await,
        Command::Socials(args) => socials::handle(session, args, global).await,
        Command::Experience(args) => experience::handle(session, args, global).await,
        Command::Watch(args) => watch::handle(session, args, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Validation {
            field: "command".into(),
            reason: "handled before a session is built".into(),
        }),
    }
}
