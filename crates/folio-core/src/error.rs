// ── Core error types ──
//
// Errors surfaced by the synchronization engine. Consumers never see raw
// HTTP or JSON failures; `From<folio_api::Error>` folds them into the
// taxonomy below. `CoreError` is `Clone` so a coalesced load can hand the
// same failure to every waiting caller.

use std::fmt;

use thiserror::Error;

use crate::model::ResourceKind;

/// Coarse classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Auth,
    Validation,
    NotFound,
    Conflict,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Network => "network",
            Self::Auth => "auth",
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Network ──────────────────────────────────────────────────────
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Realtime channel disconnected")]
    Disconnected,

    #[error("Load cancelled before it completed")]
    Cancelled,

    // ── Authorization ────────────────────────────────────────────────
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Malformed response: {message}")]
    Malformed { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn not_found(kind: ResourceKind, id: impl ToString) -> Self {
        Self::NotFound {
            kind: kind.to_string(),
            id: id.to_string(),
        }
    }

    /// Place this error in the network / auth / validation / not-found /
    /// conflict taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } | Self::Timeout { .. } | Self::Disconnected => {
                ErrorKind::Network
            }
            Self::Unauthorized { .. } => ErrorKind::Auth,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Cancelled
            | Self::Malformed { .. }
            | Self::Config { .. }
            | Self::Internal(_) => ErrorKind::Other,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<folio_api::Error> for CoreError {
    fn from(err: folio_api::Error) -> Self {
        match err {
            folio_api::Error::Unauthorized { status, message } => CoreError::Unauthorized {
                message: format!("HTTP {status}: {message}"),
            },
            folio_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else {
                    CoreError::Network {
                        message: e.to_string(),
                    }
                }
            }
            folio_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            folio_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            folio_api::Error::Validation { message } => CoreError::Validation { message },
            folio_api::Error::NotFound { path } => {
                let mut segments = path.trim_matches('/').rsplit('/');
                let last = segments.next().unwrap_or_default().to_owned();
                match segments.next() {
                    Some(table) => CoreError::NotFound {
                        kind: table.to_owned(),
                        id: last,
                    },
                    None => CoreError::NotFound {
                        kind: last,
                        id: String::new(),
                    },
                }
            }
            folio_api::Error::Conflict { message } => CoreError::Conflict { message },
            folio_api::Error::Api { status, message } => CoreError::Network {
                message: format!("HTTP {status}: {message}"),
            },
            folio_api::Error::RealtimeConnect(reason) => CoreError::Network {
                message: format!("Realtime connection failed: {reason}"),
            },
            folio_api::Error::RealtimeClosed { .. } => CoreError::Disconnected,
            folio_api::Error::Deserialization { message, body: _ } => {
                CoreError::Malformed { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_land_in_taxonomy() {
        let cases = [
            (
                folio_api::Error::Unauthorized {
                    status: 403,
                    message: "no".into(),
                },
                ErrorKind::Auth,
            ),
            (
                folio_api::Error::Validation {
                    message: "bad".into(),
                },
                ErrorKind::Validation,
            ),
            (
                folio_api::Error::Conflict {
                    message: "stale".into(),
                },
                ErrorKind::Conflict,
            ),
            (
                folio_api::Error::Timeout { timeout_secs: 5 },
                ErrorKind::Network,
            ),
        ];
        for (api, kind) in cases {
            assert_eq!(CoreError::from(api).kind(), kind);
        }
    }

    #[test]
    fn not_found_path_splits_into_table_and_id() {
        let err = CoreError::from(folio_api::Error::NotFound {
            path: "/rest/v1/projects/12".into(),
        });
        match err {
            CoreError::NotFound { kind, id } => {
                assert_eq!(kind, "projects");
                assert_eq!(id, "12");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
