//! CLI configuration: a thin layer over `folio_config` that applies
//! `GlobalOpts` flag overrides (--api-url, --token, --admin, --timeout).

use std::time::Duration;

use secrecy::SecretString;

use folio_core::SessionConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use folio_config::{
    Config, Profile, config_path, load_config, load_config_or_default, save_config,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

fn parse_api_url(raw: &str) -> Result<url::Url, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: "api-url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Build a `SessionConfig` from the config file, profile, and CLI overrides.
///
/// Without a matching profile, `--api-url` alone is enough: reads work
/// anonymously and edits still need `--admin`.
pub fn build_session_config(global: &GlobalOpts) -> Result<SessionConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let mut session = if let Some(profile) = cfg.profiles.get(&profile_name) {
        let mut session =
            folio_config::profile_to_session_config(profile, &profile_name, &cfg.defaults)?;
        if let Some(ref raw) = global.api_url {
            session.api_url = parse_api_url(raw)?;
        }
        session
    } else if let Some(ref raw) = global.api_url {
        let mut session = SessionConfig::new(parse_api_url(raw)?);
        session.timeout = Duration::from_secs(cfg.defaults.timeout);
        session.realtime_enabled = cfg.defaults.realtime;
        session
    } else if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        });
    } else {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    };

    if let Some(ref token) = global.token {
        session.token = Some(SecretString::from(token.clone()));
    }
    if global.admin {
        session.admin = true;
    }
    if let Some(secs) = global.timeout {
        session.timeout = Duration::from_secs(secs);
    }

    tracing::debug!(
        profile = %profile_name,
        api_url = %session.api_url,
        admin = session.admin,
        "session config resolved"
    );
    Ok(session)
}

fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        return "(none)".into();
    }
    cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
}
