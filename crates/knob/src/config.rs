//! CLI configuration: thin wrapper around `knob_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--endpoint, --token, etc.).

use secrecy::SecretString;

use knob_api::ClientConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use knob_config::{
    Config, Profile, config_path, load_config_or_default, save_config, store_token,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Layer global flags over a profile. Flags win; unset flags keep the
/// profile value.
pub fn apply_overrides(profile: &Profile, global: &GlobalOpts) -> Profile {
    let flag = |value: &Option<String>, fallback: &Option<String>| {
        value
            .clone()
            .filter(|v| !v.is_empty())
            .or_else(|| fallback.clone())
    };

    Profile {
        endpoint: flag(&global.endpoint, &profile.endpoint),
        project_id: flag(&global.project_id, &profile.project_id),
        project_name: flag(&global.os_project_name, &profile.project_name),
        user_name: flag(&global.os_username, &profile.user_name),
        user_domain_id: flag(&global.os_user_domain_id, &profile.user_domain_id),
        project_domain_id: flag(&global.os_project_domain_id, &profile.project_domain_id),
        region_name: flag(&global.os_region_name, &profile.region_name),
        interface: flag(&global.os_interface, &profile.interface),
        api_version: flag(&global.api_version, &profile.api_version),
        insecure: if global.insecure {
            Some(true)
        } else {
            profile.insecure
        },
        timeout: global.timeout.or(profile.timeout),
        ..profile.clone()
    }
}

/// Build a `ClientConfig` from the config file, profile, and CLI overrides.
///
/// A profile named with `--profile` must exist; the implicit default
/// profile may be absent, in which case flags and environment alone are
/// used.
pub fn build_client_config(global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let base = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None => Profile::default(),
    };

    let profile = apply_overrides(&base, global);
    let token = match global.token {
        Some(ref token) if !token.is_empty() => Some(SecretString::from(token.clone())),
        _ => knob_config::resolve_token(&profile, &profile_name),
    };

    tracing::debug!(profile = %profile_name, authenticated = token.is_some(), "resolved profile");
    Ok(knob_config::build_client_config(
        &profile,
        &cfg.defaults,
        token,
        &|key| std::env::var(key).ok(),
    )?)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["knob"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["config", "path"]);
        Cli::parse_from(argv).global
    }

    #[test]
    fn flags_override_profile_fields() {
        let profile = Profile {
            endpoint: Some("http://profile:9990".into()),
            user_name: Some("bob".into()),
            timeout: Some(5),
            ..Profile::default()
        };
        let merged = apply_overrides(
            &profile,
            &global(&["--endpoint", "http://flag:9990", "-k", "--timeout", "9"]),
        );
        assert_eq!(merged.endpoint.as_deref(), Some("http://flag:9990"));
        assert_eq!(merged.user_name.as_deref(), Some("bob"));
        assert_eq!(merged.insecure, Some(true));
        assert_eq!(merged.timeout, Some(9));
    }

    #[test]
    fn explicit_profile_wins_over_default() {
        let cfg = Config::default();
        assert_eq!(active_profile_name(&global(&[]), &cfg), "default");
        assert_eq!(active_profile_name(&global(&["-p", "lab"]), &cfg), "lab");
    }
}
