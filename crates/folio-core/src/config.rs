// ── Runtime session configuration ──
//
// Describes *where* the data API lives and *how* the engine behaves.
// Carries the bearer token but never touches disk: the CLI (via
// folio-config) builds a `SessionConfig` and hands it in.

use std::time::Duration;

use folio_api::ReconnectConfig;
use secrecy::SecretString;
use url::Url;

/// Configuration for one synchronization session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the REST surface, e.g. `https://data.example.com/rest/v1`.
    pub api_url: Url,
    /// Realtime websocket URL. `None` derives it from `api_url`.
    pub realtime_url: Option<Url>,
    /// Bearer token for the data API.
    pub token: Option<SecretString>,
    /// Whether the signed-in user holds the admin role. Mutations require it.
    pub admin: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Upper bound on a single collection load. `None` waits indefinitely.
    pub fetch_timeout: Option<Duration>,
    /// How long a confirmed mutation absorbs its own realtime echo.
    pub echo_window: Duration,
    /// Open the realtime channel on `connect()`.
    pub realtime_enabled: bool,
    pub reconnect: ReconnectConfig,
}

impl SessionConfig {
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            realtime_url: None,
            token: None,
            admin: false,
            timeout: Duration::from_secs(30),
            fetch_timeout: Some(Duration::from_secs(60)),
            echo_window: Duration::from_secs(10),
            realtime_enabled: true,
            reconnect: ReconnectConfig::default(),
        }
    }

    /// The websocket URL to use: explicit, or `api_url` with a `ws(s)`
    /// scheme and `/realtime` appended.
    pub fn resolved_realtime_url(&self) -> Option<Url> {
        if let Some(url) = &self.realtime_url {
            return Some(url.clone());
        }
        let mut url = self.api_url.clone();
        let scheme = match url.scheme() {
            "https" => "wss",
            "http" => "ws",
            _ => return None,
        };
        url.set_scheme(scheme).ok()?;
        let path = format!("{}/realtime", url.path().trim_end_matches('/'));
        url.set_path(&path);
        Some(url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn derives_websocket_url_from_api_url() {
        let cfg = SessionConfig::new(Url::parse("https://data.example.com/rest/v1/").unwrap());
        assert_eq!(
            cfg.resolved_realtime_url().unwrap().as_str(),
            "wss://data.example.com/rest/v1/realtime"
        );
    }

    #[test]
    fn explicit_realtime_url_wins() {
        let mut cfg = SessionConfig::new(Url::parse("http://localhost:8080").unwrap());
        cfg.realtime_url = Some(Url::parse("ws://localhost:9000/socket").unwrap());
        assert_eq!(
            cfg.resolved_realtime_url().unwrap().as_str(),
            "ws://localhost:9000/socket"
        );
    }
}
