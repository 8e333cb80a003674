//! Shared configuration for Knob tools.
//!
//! TOML profiles, OpenStack-style environment fallbacks, token resolution
//! (env var + keyring + plaintext), and translation to
//! `knob_api::ClientConfig`. The CLI layers its flag overrides on top.

use std::collections::HashMap;
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

use knob_api::{ClientConfig, IdentityContext, Session};

const KEYRING_SERVICE: &str = "knob";

/// Environment variables consulted when a profile leaves a field unset.
pub mod env {
    pub const PROJECT_NAME: &str = "OS_PROJECT_NAME";
    pub const USERNAME: &str = "OS_USERNAME";
    pub const USER_DOMAIN_ID: &str = "OS_USER_DOMAIN_ID";
    pub const PROJECT_DOMAIN_ID: &str = "OS_PROJECT_DOMAIN_ID";
    pub const PROJECT_ID: &str = "OS_PROJECT_ID";
    pub const AUTH_TOKEN: &str = "OS_AUTH_TOKEN";
    pub const REGION_NAME: &str = "OS_REGION_NAME";
    pub const INTERFACE: &str = "OS_INTERFACE";
    pub const ENDPOINT: &str = "KNOB_ENDPOINT";
    pub const API_VERSION: &str = "KNOB_API_VERSION";
}

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("missing {field}: set it in the profile or export {env}")]
    MissingIdentity {
        field: &'static str,
        env: &'static str,
    },

    #[error("keyring error: {0}")]
    Keyring(String),

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
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named service profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_interface")]
    pub interface: String,

    #[serde(default = "default_service_type")]
    pub service_type: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
            api_version: default_api_version(),
            interface: default_interface(),
            service_type: default_service_type(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_api_version() -> String {
    knob_api::client::DEFAULT_API_VERSION.into()
}
fn default_interface() -> String {
    knob_api::client::DEFAULT_INTERFACE.into()
}
fn default_service_type() -> String {
    knob_api::client::DEFAULT_SERVICE_TYPE.into()
}

/// A named Knob profile. Every field is optional; unset identity fields fall
/// back to the `OS_*` environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Knob base URL (e.g., "https://knob.example.com:9990").
    pub endpoint: Option<String>,

    /// Project id sent as `X-Project-Id`.
    pub project_id: Option<String>,

    pub project_name: Option<String>,
    pub user_name: Option<String>,
    pub user_domain_id: Option<String>,
    pub project_domain_id: Option<String>,

    /// Auth token (plaintext, prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the auth token.
    pub token_env: Option<String>,

    /// Endpoint filters, used when the endpoint comes from a session catalog.
    pub region_name: Option<String>,
    pub interface: Option<String>,
    pub service_type: Option<String>,
    pub service_name: Option<String>,

    pub api_version: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "knob", "knob").map_or_else(
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
    p.push("knob");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then the TOML file at `path` (if present), then `KNOB_*`
/// variables. Nested keys use a double underscore: `KNOB_DEFAULTS__TIMEOUT`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("KNOB_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
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
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/token"))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// Resolve the auth token for a profile, if one is configured.
///
/// Chain: the profile's `token_env` variable, the system keyring, then the
/// plaintext `token` field.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's token_env → env var lookup
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    profile.token.clone().map(SecretString::from)
}

/// Store a token for `profile_name` in the system keyring.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?
        .set_password(token)
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

// ── Translation to ClientConfig ─────────────────────────────────────

/// Build a `ClientConfig` from a profile and the process environment.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let token = resolve_token(profile, profile_name);
    build_client_config(profile, defaults, token, &|key| std::env::var(key).ok())
}

/// Translation with an injectable environment lookup.
pub fn build_client_config(
    profile: &Profile,
    defaults: &Defaults,
    token: Option<SecretString>,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<ClientConfig, ConfigError> {
    let pick = |value: &Option<String>, var: &str| {
        value
            .clone()
            .filter(|v| !v.is_empty())
            .or_else(|| lookup(var).filter(|v| !v.is_empty()))
    };
    let require = |value: &Option<String>, field: &'static str, var: &'static str| {
        pick(value, var).ok_or(ConfigError::MissingIdentity { field, env: var })
    };

    let identity = IdentityContext::new(
        require(&profile.project_name, "project name", env::PROJECT_NAME)?,
        require(&profile.user_name, "user name", env::USERNAME)?,
        require(&profile.user_domain_id, "user domain id", env::USER_DOMAIN_ID)?,
        require(&profile.project_domain_id, "project domain id", env::PROJECT_DOMAIN_ID)?,
    );

    let mut config = ClientConfig::new(identity)
        .verify(!profile.insecure.unwrap_or(defaults.insecure))
        .timeout(Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)))
        .interface(
            pick(&profile.interface, env::INTERFACE).unwrap_or_else(|| defaults.interface.clone()),
        )
        .service_type(
            profile
                .service_type
                .clone()
                .unwrap_or_else(|| defaults.service_type.clone()),
        )
        .api_version(
            pick(&profile.api_version, env::API_VERSION)
                .unwrap_or_else(|| defaults.api_version.clone()),
        );

    if let Some(endpoint) = pick(&profile.endpoint, env::ENDPOINT) {
        url::Url::parse(&endpoint).map_err(|_| ConfigError::Validation {
            field: "endpoint".into(),
            reason: format!("invalid URL: {endpoint}"),
        })?;
        config = config.endpoint(endpoint);
    }

    let project_id = pick(&profile.project_id, env::PROJECT_ID);
    if let Some(ref project_id) = project_id {
        config = config.project_id(project_id.clone());
    }
    if let Some(token) = token {
        let mut session = Session::new(token);
        if let Some(project_id) = project_id {
            session = session.with_project_id(project_id);
        }
        config = config.session(session);
    }
    if let Some(region) = pick(&profile.region_name, env::REGION_NAME) {
        config = config.region_name(region);
    }
    if let Some(ref name) = profile.service_name {
        config = config.service_name(name.clone());
    }
    if let Some(ref ca_cert) = profile.ca_cert {
        config = config.ca_cert(ca_cert.clone());
    }

    Ok(config)
}
