//! Config subcommand handlers.

use std::path::PathBuf;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// A copy of `cfg` safe to print: plaintext tokens are masked.
fn redacted(cfg: &Config) -> Config {
    Config {
        default_profile: cfg.default_profile.clone(),
        defaults: cfg.defaults.clone(),
        profiles: cfg
            .profiles
            .iter()
            .map(|(name, profile)| {
                let mut profile = profile.clone();
                if profile.token.is_some() {
                    profile.token = Some("****".into());
                }
                (name.clone(), profile)
            })
            .collect(),
    }
}

fn to_toml(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_default()
}

fn parse_bool(key: &str, value: &str) -> Result<bool, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: key.into(),
        reason: format!("expected true or false, got '{value}'"),
    })
}

/// Set one profile field from its config-file name.
fn set_field(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    let slot = match key {
        "endpoint" => &mut profile.endpoint,
        "project_id" => &mut profile.project_id,
        "project_name" => &mut profile.project_name,
        "user_name" => &mut profile.user_name,
        "user_domain_id" => &mut profile.user_domain_id,
        "project_domain_id" => &mut profile.project_domain_id,
        "token_env" => &mut profile.token_env,
        "region_name" => &mut profile.region_name,
        "interface" => &mut profile.interface,
        "service_type" => &mut profile.service_type,
        "service_name" => &mut profile.service_name,
        "api_version" => &mut profile.api_version,
        "ca_cert" => {
            profile.ca_cert = Some(PathBuf::from(value));
            return Ok(());
        }
        "insecure" => {
            profile.insecure = Some(parse_bool(key, &value)?);
            return Ok(());
        }
        "timeout" => {
            profile.timeout = Some(value.parse().map_err(|_| CliError::Validation {
                field: key.into(),
                reason: format!("expected a number of seconds, got '{value}'"),
            })?);
            return Ok(());
        }
        "token" => {
            return Err(CliError::Validation {
                field: key.into(),
                reason: "store tokens with: knob config set-token".into(),
            });
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: "unknown profile field".into(),
            });
        }
    };
    *slot = Some(value);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(&global.output, &cfg, to_toml, |c| {
                c.default_profile.clone().unwrap_or_default()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(name.clone()).or_default();
            set_field(profile, &key, value)?;
            config::save_config(&cfg)?;
            output::print_status(&format!("Set {key} on profile '{name}'"), global.quiet);
            Ok(())
        }

        ConfigCommand::SetToken { from_env } => {
            let cfg = config::load_config_or_default();
            let name = config::active_profile_name(global, &cfg);

            let token = match from_env {
                Some(var) => std::env::var(&var).map_err(|_| CliError::Validation {
                    field: "from-env".into(),
                    reason: format!("environment variable {var} is not set"),
                })?,
                None => rpassword::prompt_password("Auth token: ").map_err(|e| {
                    CliError::Validation {
                        field: "token".into(),
                        reason: format!("prompt failed: {e}"),
                    }
                })?,
            };
            if token.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "token".into(),
                    reason: "token cannot be empty".into(),
                });
            }

            config::store_token(&name, token.trim())?;
            output::print_status(
                &format!("Token for profile '{name}' stored in system keyring"),
                global.quiet,
            );
            Ok(())
        }
    }
}
