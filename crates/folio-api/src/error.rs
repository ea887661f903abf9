use thiserror::Error;

/// Top-level error type for the `folio-api` crate.
///
/// Covers every failure mode of the REST endpoints and the realtime channel.
/// `folio-core` maps these into the engine's error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authorization ───────────────────────────────────────────────
    /// 401 / 403 from the data API.
    #[error("Unauthorized (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── API responses ───────────────────────────────────────────────
    /// 400 or a payload the server refused to accept.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// 404: the table or row does not exist.
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// 409: the write collided with a concurrent edit.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Any other non-success response, or a 2xx body carrying an `error` field.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Realtime ────────────────────────────────────────────────────
    /// Realtime websocket connection failed.
    #[error("Realtime connection failed: {0}")]
    RealtimeConnect(String),

    /// Realtime websocket closed unexpectedly.
    #[error("Realtime channel closed (code {code}): {reason}")]
    RealtimeClosed { code: u16, reason: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::RealtimeConnect(_) => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// Returns `true` if the server rejected the bearer token or role.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::Validation { .. } => Some(400),
            Self::NotFound { .. } => Some(404),
            Self::Conflict { .. } => Some(409),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
