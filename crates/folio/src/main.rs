mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use folio_core::SyncSession;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

/// `json` switches stderr logs to one JSON object per line.
const LOG_FORMAT_ENV: &str = "FOLIO_LOG_FORMAT";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let format = LogFormat::parse(std::env::var(LOG_FORMAT_ENV).ok().as_deref());
    init_tracing(cli.global.verbose, format);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

// ── Logging ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info,folio_core=debug",
        2 => "debug",
        _ => "trace",
    }
}

fn init_tracing(verbosity: u8, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

// ── Session lifecycle ────────────────────────────────────────────────

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a session
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "folio", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let session = SyncSession::new(config::build_session_config(&cli.global)?)?;
            let result = run_interruptible(&session, cmd, &cli.global).await;
            shutdown(&session).await;
            result
        }
    }
}

/// Dispatch `cmd`, giving up on Ctrl-C. `watch` only ends that way, so for
/// it an interrupt is a normal exit.
async fn run_interruptible(
    session: &SyncSession,
    cmd: Command,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let runs_until_interrupted = matches!(cmd, Command::Watch(_));
    debug!(command = ?cmd, "dispatching command");

    tokio::select! {
        result = commands::dispatch(cmd, session, global) => result,
        _ = tokio::signal::ctrl_c() => {
            debug!("interrupted");
            if runs_until_interrupted {
                Ok(())
            } else {
                Err(CliError::Interrupted)
            }
        }
    }
}

async fn shutdown(session: &SyncSession) {
    let unconfirmed = session.pending_mutations();
    if unconfirmed > 0 {
        warn!(
            unconfirmed,
            "exiting before the server answered; list again to see what was applied"
        );
    }
    session.disconnect().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_accepts_json_in_any_case() {
        assert_eq!(LogFormat::parse(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some(" JSON ")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Text);
        assert_eq!(LogFormat::parse(None), LogFormat::Text);
    }

    #[test]
    fn verbosity_widens_the_filter() {
        assert_eq!(default_filter(0), "warn");
        assert_eq!(default_filter(2), "debug");
        assert_eq!(default_filter(9), "trace");
    }
}
