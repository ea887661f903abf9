//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Password, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

fn redact(cfg: Config) -> Config {
    Config {
        profiles: cfg
            .profiles
            .into_iter()
            .map(|(name, mut profile)| {
                if profile.token.is_some() {
                    profile.token = Some(REDACTED.into());
                }
                (name, profile)
            })
            .collect(),
        ..cfg
    }
}

fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("folio configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let mut cfg = config::load_config_or_default();

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()?;

    let api_url: String = Input::new()
        .with_prompt("Data API URL")
        .validate_with(|input: &String| {
            input
                .parse::<url::Url>()
                .map(|_| ())
                .map_err(|e| format!("invalid URL: {e}"))
        })
        .interact_text()?;

    let admin = Confirm::new()
        .with_prompt("Use admin rights with this profile?")
        .default(false)
        .interact()?;

    let token = Password::new()
        .with_prompt("Bearer token (empty for anonymous reads)")
        .allow_empty_password(true)
        .interact()?;

    let mut profile = Profile {
        api_url,
        admin,
        ..Profile::default()
    };

    if !token.is_empty() {
        let store_choices = &[
            "Store in system keyring (recommended)",
            "Save to config file (plaintext)",
        ];
        let store_selection = Select::new()
            .with_prompt("Where to store the token?")
            .items(store_choices)
            .default(0)
            .interact()?;
        if store_selection == 0 {
            folio_config::store_token(&profile_name, &token)?;
            eprintln!("   ✓ Token stored in system keyring");
        } else {
            profile.token = Some(token);
        }
    }

    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: folio projects list");
    Ok(())
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = redact(config::load_config()?);
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| serde_yaml::to_string(c).unwrap_or_default(),
                |c| c.default_profile.clone().unwrap_or_default(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::SetToken { value } => {
            let cfg = config::load_config()?;
            let profile_name = config::active_profile_name(global, &cfg);
            let token = match value {
                Some(v) => v,
                None => Password::new()
                    .with_prompt(format!("Token for profile '{profile_name}'"))
                    .interact()?,
            };
            if token.is_empty() {
                return Err(CliError::Validation {
                    field: "token".into(),
                    reason: "token cannot be empty".into(),
                });
            }
            folio_config::store_token(&profile_name, &token)?;
            if !global.quiet {
                eprintln!("✓ Token stored in system keyring for profile '{profile_name}'");
            }
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_hides_plaintext_tokens_only() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "a".into(),
            Profile {
                api_url: "https://a.example".into(),
                token: Some("secret".into()),
                ..Profile::default()
            },
        );
        cfg.profiles.insert(
            "b".into(),
            Profile {
                api_url: "https://b.example".into(),
                ..Profile::default()
            },
        );

        let cfg = redact(cfg);
        assert_eq!(cfg.profiles["a"].token.as_deref(), Some(REDACTED));
        assert_eq!(cfg.profiles["b"].token, None);
    }
}
