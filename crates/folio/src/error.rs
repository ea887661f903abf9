//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use std::str::FromStr;

use miette::Diagnostic;
use thiserror::Error;

use folio_config::ConfigError;
use folio_core::{CoreError, ResourceKind};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const INTERRUPTED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the data API: {message}")]
    #[diagnostic(
        code(folio::connection_failed),
        help(
            "Check the API URL and your network connection.\n\
             Override the URL with --api-url or FOLIO_API_URL."
        )
    )]
    ConnectionFailed { message: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(folio::timeout),
        help("Increase the timeout with --timeout or check the API's responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authorization ────────────────────────────────────────────────
    #[error("Not authorized: {message}")]
    #[diagnostic(
        code(folio::unauthorized),
        help(
            "Edits need admin rights: pass --admin or set `admin = true` in the profile.\n\
             Store a token with: folio config set-token"
        )
    )]
    Unauthorized { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(folio::not_found),
        help("Run: folio {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Conflict: {message}")]
    #[diagnostic(
        code(folio::conflict),
        help("The row changed on the server. List it again and retry.")
    )]
    Conflict { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(folio::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(folio::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(folio::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: folio config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No data API configured")]
    #[diagnostic(
        code(folio::no_config),
        help(
            "Create a profile with: folio config init\n\
             Or pass --api-url. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(folio::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(folio::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    #[error("Prompt failed: {0}")]
    #[diagnostic(code(folio::prompt))]
    Prompt(#[from] dialoguer::Error),

    #[error("Interrupted")]
    #[diagnostic(
        code(folio::interrupted),
        help("Writes still in flight may or may not have reached the server.")
    )]
    Interrupted,

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(folio::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("YAML rendering failed: {0}")]
    #[diagnostic(code(folio::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Unauthorized { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Interrupted => exit_code::INTERRUPTED,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } | Self::Json(_) => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

/// CLI subcommand listing a resource table.
pub fn list_command(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Projects => "projects list",
        ResourceKind::TechStack => "tech list",
        ResourceKind::SocialLinks => "socials list",
        ResourceKind::WorkExperience => "experience list",
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Network { message } => CliError::ConnectionFailed { message },

            CoreError::Disconnected => CliError::ConnectionFailed {
                message: "realtime channel disconnected".into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::Unauthorized { message } => CliError::Unauthorized { message },

            CoreError::NotFound { kind, id } => {
                let list_command = ResourceKind::from_str(&kind)
                    .map_or_else(|_| format!("{kind} list"), |k| list_command(k).to_owned());
                CliError::NotFound {
                    resource_type: kind,
                    identifier: id,
                    list_command,
                }
            }

            CoreError::Conflict { message } => CliError::Conflict { message },

            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Malformed { message } => CliError::ApiError {
                code: "malformed".into(),
                message,
            },

            CoreError::Cancelled => CliError::ApiError {
                code: "cancelled".into(),
                message: "load cancelled".into(),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (CoreError::Network { message: "refused".into() }, exit_code::CONNECTION),
            (CoreError::Timeout { timeout_secs: 5 }, exit_code::TIMEOUT),
            (CoreError::Unauthorized { message: "admin".into() }, exit_code::AUTH),
            (CoreError::Conflict { message: "changed".into() }, exit_code::CONFLICT),
            (CoreError::Validation { message: "title".into() }, exit_code::USAGE),
            (CoreError::Internal("boom".into()), exit_code::GENERAL),
        ];
        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }

    #[test]
    fn interrupt_uses_the_shell_sigint_code() {
        assert_eq!(CliError::Interrupted.exit_code(), 130);
    }

    #[test]
    fn not_found_points_at_the_right_list_command() {
        let err = CliError::from(CoreError::NotFound {
            kind: "social_links".into(),
            id: "9".into(),
        });
        match err {
            CliError::NotFound { list_command, .. } => assert_eq!(list_command, "socials list"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
