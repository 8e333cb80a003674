use thiserror::Error;

/// Top-level error type for the `knob-api` crate.
///
/// The HTTP variants (`Auth`, `Client`, `Server`) are produced exclusively by
/// the request adapter from the response status; callers match on the variant
/// instead of inspecting raw status codes.
#[derive(Debug, Error)]
pub enum Error {
    // ── Construction ────────────────────────────────────────────────
    /// Neither an authenticated session nor an explicit endpoint + project
    /// were supplied. Raised before any request is attempted.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // ── HTTP status classes ─────────────────────────────────────────
    /// HTTP 401 from the Knob service.
    #[error("{message}")]
    Auth { message: String },

    /// HTTP 5xx, or a response without a usable status code.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// HTTP 4xx other than 401. A 404 is the "not found" specialization,
    /// see [`Error::is_not_found`].
    #[error("{message}")]
    Client { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// A successful response carried a body that is not valid JSON.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// The response lacked the envelope key the endpoint is expected to use.
    #[error("Response is missing the '{key}' envelope key")]
    MissingEnvelope { key: String },

    /// The resource kind has no endpoint for the requested operation.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// An identifier that cannot name exactly one entity: empty, `.`, `..`,
    /// or an object carrying no uuid, id or name.
    #[error("Invalid resource identifier {id:?}: {reason}")]
    InvalidIdentifier { id: String, reason: &'static str },
}

impl Error {
    /// Build an [`Error::Auth`], substituting the fixed description when the
    /// server produced no usable message.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: or_default(message.into(), AUTH_DESCRIPTION),
        }
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: or_default(message.into(), SERVER_DESCRIPTION),
        }
    }

    pub fn client(status: u16, message: impl Into<String>) -> Self {
        Self::Client {
            status,
            message: or_default(message.into(), CLIENT_DESCRIPTION),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` for a 404 client error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Client { status: 404, .. })
    }

    /// Returns `true` if re-authenticating might resolve this error.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// Returns `true` for failures a caller may choose to retry.
    ///
    /// The client itself never retries.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Server { .. } => true,
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// The HTTP status code carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Auth { .. } => Some(401),
            Self::Server { status, .. } | Self::Client { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server-extracted message for HTTP errors.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Auth { message }
            | Self::Server { message, .. }
            | Self::Client { message, .. } => Some(message),
            _ => None,
        }
    }
}

const AUTH_DESCRIPTION: &str = "Raised for 401 Unauthorized responses from the server.";
const SERVER_DESCRIPTION: &str = "Raised for 5xx responses from the server.";
const CLIENT_DESCRIPTION: &str = "Raised for 4xx responses from the server.";

fn or_default(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_owned()
    } else {
        message
    }
}

// ── Status classification ───────────────────────────────────────────

/// Outcome class of an HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum StatusClass {
    #[strum(to_string = "success")]
    Success,
    #[strum(to_string = "auth error")]
    Auth,
    #[strum(to_string = "4xx client error")]
    Client(u16),
    #[strum(to_string = "5xx server error")]
    Server(u16),
}

/// Classify a response status. Depends on the status code alone.
///
/// A missing or zero status is treated as a server failure.
pub fn classify_status(status: Option<u16>) -> StatusClass {
    match status {
        Some(401) => StatusClass::Auth,
        None | Some(0) => StatusClass::Server(0),
        Some(s) if s >= 500 => StatusClass::Server(s),
        Some(s) if s >= 400 => StatusClass::Client(s),
        Some(_) => StatusClass::Success,
    }
}

// ── Error-message extraction ────────────────────────────────────────

/// Extract a human-readable message from a failed response body.
///
/// Reads `title` and, when non-empty, appends `description` after `": "`.
/// Anything else (invalid JSON, JSON without `title`, empty body) yields the
/// raw body text. Never fails.
pub fn extract_error_message(body: &[u8]) -> String {
    let raw = || String::from_utf8_lossy(body).into_owned();

    let Ok(serde_json::Value::Object(map)) = serde_json::from_slice::<serde_json::Value>(body)
    else {
        return raw();
    };
    let Some(title) = map.get("title").filter(|v| !v.is_null()) else {
        return raw();
    };

    let mut message = json_text(title);
    if let Some(description) = map.get("description").filter(|v| is_truthy(v)) {
        message = format!("{message}: {}", json_text(description));
    }
    message
}

fn json_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// JSON truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are falsy.
pub(crate) fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn classify_401_is_auth() {
        assert_eq!(classify_status(Some(401)), StatusClass::Auth);
    }

    #[test]
    fn classify_absent_or_zero_is_server() {
        assert_eq!(classify_status(None), StatusClass::Server(0));
        assert_eq!(classify_status(Some(0)), StatusClass::Server(0));
    }

    #[test]
    fn classify_ranges() {
        for s in 500..=599 {
            assert_eq!(classify_status(Some(s)), StatusClass::Server(s));
        }
        for s in (400..=499).filter(|s| *s != 401) {
            assert_eq!(classify_status(Some(s)), StatusClass::Client(s));
        }
        for s in 200..=299 {
            assert_eq!(classify_status(Some(s)), StatusClass::Success);
        }
    }

    #[test]
    fn extract_title_and_description() {
        let body = br#"{"title":"Not Found","description":"no such gate"}"#;
        assert_eq!(extract_error_message(body), "Not Found: no such gate");
    }

    #[test]
    fn extract_title_only() {
        assert_eq!(extract_error_message(br#"{"title":"Conflict"}"#), "Conflict");
        assert_eq!(
            extract_error_message(br#"{"title":"Conflict","description":""}"#),
            "Conflict"
        );
    }

    #[test]
    fn extract_without_title_falls_back_to_raw() {
        let body = br#"{"error":"boom"}"#;
        assert_eq!(extract_error_message(body), r#"{"error":"boom"}"#);
    }

    #[test]
    fn extract_invalid_json_and_empty() {
        assert_eq!(extract_error_message(b"<html>502</html>"), "<html>502</html>");
        assert_eq!(extract_error_message(b""), "");
        assert_eq!(extract_error_message(&[0xff, 0xfe]), "\u{fffd}\u{fffd}");
    }

    #[test]
    fn empty_message_degrades_to_description() {
        let err = Error::client(404, "");
        assert_eq!(err.to_string(), CLIENT_DESCRIPTION);
        assert!(err.is_not_found());

        let err = Error::auth("  ");
        assert_eq!(err.message(), Some(AUTH_DESCRIPTION));
        assert_eq!(err.status_code(), Some(401));
    }

    #[test]
    fn only_http_variants_carry_a_status() {
        assert_eq!(Error::server(0, "no status").status_code(), Some(0));
        assert_eq!(Error::client(404, "gone").status_code(), Some(404));

        let err = Error::Tls("bad certificate".into());
        assert_eq!(err.status_code(), None);
        assert!(!err.is_not_found());
        assert!(!Error::server(404, "odd").is_not_found());
    }

    #[test]
    fn server_errors_are_transient() {
        assert!(Error::server(503, "busy").is_transient());
        assert!(!Error::client(400, "bad").is_transient());
    }
}
