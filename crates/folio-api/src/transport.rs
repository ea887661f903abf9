// Shared transport configuration for building reqwest::Client instances.
//
// The REST client and the realtime handshake share timeout and bearer
// token settings through this module.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

const USER_AGENT: &str = concat!("folio/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    /// Bearer token sent as `Authorization: Bearer <token>` on every request.
    pub bearer_token: Option<SecretString>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            bearer_token: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        if let Some(value) = self.authorization_value()? {
            headers.insert(AUTHORIZATION, value);
        }

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(Error::Transport)
    }

    /// The `Authorization` header value, marked sensitive so it never
    /// shows up in debug output.
    pub fn authorization_value(&self) -> Result<Option<HeaderValue>, Error> {
        let Some(token) = self.bearer_token.as_ref() else {
            return Ok(None);
        };
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| Error::Unauthorized {
                status: 0,
                message: format!("invalid bearer token header value: {e}"),
            })?;
        value.set_sensitive(true);
        Ok(Some(value))
    }

    /// Builder-style helper to attach a bearer token.
    pub fn with_bearer_token(mut self, token: SecretString) -> Self {
        self.bearer_token = Some(token);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn no_token_means_no_authorization_header() {
        let config = TransportConfig::default();
        assert!(config.authorization_value().unwrap().is_none());
    }

    #[test]
    fn bearer_header_is_sensitive() {
        let config =
            TransportConfig::default().with_bearer_token(SecretString::from("abc123".to_owned()));
        let value = config.authorization_value().unwrap().unwrap();
        assert!(value.is_sensitive());
        assert_eq!(value.to_str().unwrap(), "Bearer abc123");
    }
}
