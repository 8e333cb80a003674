// Transport configuration for building the reqwest::Client behind the
// request adapter: TLS verification, timeout and user agent.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

const USER_AGENT: &str = concat!("knob-api/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate ("insecure" mode).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Derive the TLS mode from the `verify` toggle and an optional CA bundle.
    pub fn new(verify: bool, ca_cert: Option<PathBuf>, timeout: Duration) -> Self {
        let tls = match (verify, ca_cert) {
            (false, _) => TlsMode::DangerAcceptInvalid,
            (true, Some(path)) => TlsMode::CustomCa(path),
            (true, None) => TlsMode::System,
        };
        Self { tls, timeout }
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_off_wins_over_ca_bundle() {
        let cfg = TransportConfig::new(false, Some("/tmp/ca.pem".into()), Duration::from_secs(5));
        assert_eq!(cfg.tls, TlsMode::DangerAcceptInvalid);
    }

    #[test]
    fn verify_on_uses_ca_bundle_when_given() {
        let cfg = TransportConfig::new(true, Some("/tmp/ca.pem".into()), Duration::from_secs(5));
        assert_eq!(cfg.tls, TlsMode::CustomCa("/tmp/ca.pem".into()));
        assert_eq!(TransportConfig::new(true, None, cfg.timeout).tls, TlsMode::System);
    }

    #[test]
    fn missing_ca_bundle_is_tls_error() {
        let cfg = TransportConfig::new(
            true,
            Some("/nonexistent/knob-ca.pem".into()),
            Duration::from_secs(5),
        );
        assert!(matches!(cfg.build_client(), Err(Error::Tls(_))));
    }
}
