//! Shared configuration for folio tools.
//!
//! TOML profiles, bearer-token resolution (env + keyring + plaintext),
//! and translation to `folio_core::SessionConfig`. The engine never reads
//! these types; the CLI layers its flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use folio_core::SessionConfig;

const KEYRING_SERVICE: &str = "folio";

/// Environment variable that points at an alternate config file.
pub const CONFIG_PATH_ENV: &str = "FOLIO_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no token configured for profile '{profile}'")]
    NoToken { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named data-API profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_true")]
    pub realtime: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            realtime: true,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

/// A named data-API profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// REST base URL (e.g., "https://data.example.com/rest/v1").
    pub api_url: String,

    /// Realtime websocket URL. Derived from `api_url` when absent.
    pub realtime_url: Option<String>,

    /// Bearer token (plaintext; prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,

    /// Whether this profile's user holds the admin role.
    #[serde(default)]
    pub admin: bool,

    /// Per-request timeout override, seconds.
    pub timeout: Option<u64>,

    /// Upper bound on a collection load, seconds. `0` disables it.
    pub fetch_timeout: Option<u64>,

    /// Override the realtime default.
    pub realtime: Option<bool>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `FOLIO_CONFIG`, then platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "folio", "folio").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("folio");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then the TOML file at `path` (if present), then `FOLIO_`
/// variables with `__` as the nesting separator
/// (`FOLIO_DEFAULTS__OUTPUT=json`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FOLIO_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if the file is missing or invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML at the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/token"),
    )?)
}

/// Resolve the bearer token: `token_env` variable, then the system
/// keyring, then plaintext in the profile.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    if let Some(ref token) = profile.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoToken {
        profile: profile_name.into(),
    })
}

/// Store a token in the system keyring for `profile_name`.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(token)?;
    Ok(())
}

// ── Translation to SessionConfig ────────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

/// Build a `SessionConfig` from a profile, without CLI overrides.
///
/// A missing token is not an error: reads against a public data API work
/// anonymously, and mutations are gated on `admin` anyway.
pub fn profile_to_session_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<SessionConfig, ConfigError> {
    let api_url = parse_url("api_url", &profile.api_url)?;
    let mut config = SessionConfig::new(api_url);

    config.realtime_url = profile
        .realtime_url
        .as_deref()
        .map(|raw| parse_url("realtime_url", raw))
        .transpose()?;
    config.token = resolve_token(profile, profile_name).ok();
    config.admin = profile.admin;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    if let Some(secs) = profile.fetch_timeout {
        config.fetch_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    config.realtime_enabled = profile.realtime.unwrap_or(defaults.realtime);

    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    const SAMPLE: &str = r#"
default_profile = "prod"

[defaults]
output = "json"
timeout = 15

[profiles.prod]
api_url = "https://data.example.com/rest/v1"
token = "plain-token"
admin = true
fetch_timeout = 0
realtime = false

[profiles.local]
api_url = "http://localhost:8080"
"#;

    #[test]
    fn loads_profiles_and_defaults_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.defaults.output, "json");
        assert_eq!(cfg.defaults.timeout, 15);
        assert!(cfg.defaults.realtime);

        assert_eq!(cfg.default_profile.as_deref(), Some("prod"));
        assert!(cfg.profiles["prod"].admin);
        assert!(!cfg.profiles["local"].admin);
        assert!(!cfg.profiles.contains_key("missing"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                api_url: "https://api.example.com".into(),
                admin: true,
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        let profile = &loaded.profiles["default"];
        assert_eq!(profile.api_url, "https://api.example.com");
        assert!(profile.admin);
    }

    #[test]
    fn session_config_applies_profile_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let cfg = load_config_from(&path).unwrap();
        let session =
            profile_to_session_config(&cfg.profiles["prod"], "prod", &cfg.defaults).unwrap();
        assert_eq!(session.api_url.as_str(), "https://data.example.com/rest/v1");
        assert_eq!(session.timeout, Duration::from_secs(15));
        assert!(session.fetch_timeout.is_none());
        assert!(!session.realtime_enabled);
        assert!(session.admin);
        assert!(session.token.is_some());
    }

    #[test]
    fn unset_token_env_falls_back_to_plaintext() {
        let profile = Profile {
            api_url: "https://api.example.com".into(),
            token: Some("plain".into()),
            token_env: Some("FOLIO_TEST_TOKEN_NEVER_SET_7c1e".into()),
            ..Profile::default()
        };
        let token = resolve_token(&profile, "folio-test-plaintext-fallback").unwrap();
        assert_eq!(token.expose_secret(), "plain");
    }

    #[test]
    fn no_token_anywhere_is_an_error() {
        let profile = Profile {
            api_url: "https://api.example.com".into(),
            ..Profile::default()
        };
        let err = resolve_token(&profile, "folio-test-no-token").unwrap_err();
        assert!(matches!(err, ConfigError::NoToken { ref profile } if profile == "folio-test-no-token"));
    }

    #[test]
    fn invalid_url_is_validation_error() {
        let profile = Profile {
            api_url: "not a url".into(),
            ..Profile::default()
        };
        let err = profile_to_session_config(&profile, "x", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "api_url"));
    }
}
