//! CLI error types with miette diagnostics.
//!
//! Maps `knob_api::Error` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use knob_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const SERVER: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to Knob at {url}")]
    #[diagnostic(
        code(knob::connection_failed),
        help(
            "Check that the Knob service is running and reachable.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS setup failed: {reason}")]
    #[diagnostic(
        code(knob::tls_error),
        help("Use --insecure (-k) to skip verification, or configure ca_cert in your profile.")
    )]
    TlsError { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(knob::auth_failed),
        help(
            "Obtain a fresh token and pass it with --token / OS_AUTH_TOKEN,\n\
             or store it with: knob config set-token"
        )
    )]
    AuthFailed { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(knob::not_found),
        help("Run: knob {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Request for {resource_type} '{identifier}' was rejected ({status}): {message}")]
    #[diagnostic(code(knob::rejected))]
    Rejected {
        resource_type: String,
        identifier: String,
        status: u16,
        message: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Request rejected ({status}): {message}")]
    #[diagnostic(code(knob::client_error))]
    ClientError { status: u16, message: String },

    #[error("Server error ({status}): {message}")]
    #[diagnostic(
        code(knob::server_error),
        help("The Knob service failed to handle the request; retry later.")
    )]
    ServerError { status: u16, message: String },

    #[error("API error: {message}")]
    #[diagnostic(code(knob::api_error))]
    ApiError { message: String },

    #[error("Operation '{operation}' is not supported")]
    #[diagnostic(code(knob::unsupported))]
    Unsupported { operation: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(knob::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(knob::configuration),
        help(
            "Pass --endpoint and --project-id (or KNOB_ENDPOINT / OS_PROJECT_ID),\n\
             or configure a profile at: {path}"
        )
    )]
    Configuration { message: String, path: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(knob::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: knob config set endpoint <url> --profile {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(knob::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(knob::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::ServerError { .. } => exit_code::SERVER,
            Self::Rejected { .. }
            | Self::ClientError { .. }
            | Self::Validation { .. }
            | Self::Configuration { .. }
            | Self::ProfileNotFound { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::Config(ConfigError::MissingIdentity { .. } | ConfigError::Validation { .. }) => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }

    /// Re-raise a client error against a named resource as a usage-level
    /// error naming the identifier. Other errors convert as usual.
    pub fn for_resource(err: knob_api::Error, resource_type: &str, identifier: &str) -> Self {
        match err {
            knob_api::Error::Client { status: 404, .. } => Self::NotFound {
                resource_type: resource_type.into(),
                identifier: identifier.into(),
                list_command: format!("{resource_type} list"),
            },
            knob_api::Error::Client { status, message } => Self::Rejected {
                resource_type: resource_type.into(),
                identifier: identifier.into(),
                status,
                message,
            },
            other => other.into(),
        }
    }
}

// ── knob_api::Error → CliError mapping ───────────────────────────────

impl From<knob_api::Error> for CliError {
    fn from(err: knob_api::Error) -> Self {
        use knob_api::Error as E;

        match err {
            E::Configuration { message } => CliError::Configuration {
                message,
                path: knob_config::config_path().display().to_string(),
            },

            E::Auth { message } => CliError::AuthFailed { message },

            E::Server { status, message } => CliError::ServerError { status, message },

            E::Client { status, message } => CliError::ClientError { status, message },

            E::Transport(e) if e.is_connect() || e.is_timeout() => CliError::ConnectionFailed {
                url: e
                    .url()
                    .map_or_else(|| "(unknown)".into(), ToString::to_string),
                source: Box::new(e),
            },

            E::Transport(e) => CliError::ApiError {
                message: e.to_string(),
            },

            E::InvalidUrl(e) => CliError::Validation {
                field: "endpoint".into(),
                reason: e.to_string(),
            },

            E::Tls(reason) => CliError::TlsError { reason },

            E::Deserialization { message, .. } => CliError::ApiError { message },

            err @ E::MissingEnvelope { .. } => CliError::ApiError {
                message: err.to_string(),
            },

            err @ E::InvalidIdentifier { .. } => CliError::Validation {
                field: "identifier".into(),
                reason: err.to_string(),
            },

            E::UnsupportedOperation(operation) => CliError::Unsupported {
                operation: operation.into(),
            },
        }
    }
}
